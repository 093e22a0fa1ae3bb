use crate::config::{ConfigError, ConfigResult, PpaConfig};
use ppa_llm::{ProviderConfig, ProviderValidator};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 配置管理器
#[derive(Clone)]
pub struct ConfigManager {
    path: PathBuf,
    config: Arc<RwLock<PpaConfig>>,
    #[cfg(feature = "hot-reload")]
    watcher: Option<Arc<std::sync::Mutex<notify::RecommendedWatcher>>>,
}

impl ConfigManager {
    /// 加载配置文件，不存在时写入默认配置
    pub async fn load(path: &Path) -> ConfigResult<Self> {
        let config = if path.exists() {
            info!("Loading config from {:?}", path);
            let config = Self::read_file(path).await?;
            Self::validate(&config)?;
            config
        } else {
            info!("Config file not found, creating default config at {:?}", path);
            let default_config = PpaConfig::default();
            // 确保父目录存在
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let content = serde_json::to_string_pretty(&default_config)?;
            tokio::fs::write(path, &content).await?;
            default_config
        };

        Ok(Self::new(config, path.to_path_buf()))
    }

    /// 从默认位置加载配置
    pub async fn load_default() -> ConfigResult<Self> {
        let config_path = Self::default_config_path()?;
        Self::load(&config_path).await
    }

    /// 获取默认配置路径 (~/.copilot-ppa/config.json)
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        crate::default_config_path()
            .ok_or_else(|| ConfigError::InvalidPath("Could not find home directory".to_string()))
    }

    /// 创建一个新的配置管理器
    pub fn new(config: PpaConfig, path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(config)),
            #[cfg(feature = "hot-reload")]
            watcher: None,
        }
    }

    /// 获取配置的共享句柄
    pub fn get(&self) -> Arc<RwLock<PpaConfig>> {
        Arc::clone(&self.config)
    }

    /// 当前配置的快照
    pub async fn snapshot(&self) -> PpaConfig {
        self.config.read().await.clone()
    }

    /// 读取并校验某个 provider 的配置
    pub async fn provider_config(&self, id: &str) -> ConfigResult<ProviderConfig> {
        let raw = {
            let config = self.config.read().await;
            config
                .llm
                .providers
                .get(id)
                .cloned()
                .ok_or_else(|| ConfigError::ProviderNotFound(id.to_string()))?
        };

        ProviderConfig::from_json(&raw).map_err(|e| {
            ConfigError::Validation(format!("provider '{}': {}", id, e))
        })
    }

    /// 默认 provider 的配置
    pub async fn default_provider_config(&self) -> ConfigResult<ProviderConfig> {
        let id = self.config.read().await.llm.default_provider.clone();
        self.provider_config(&id).await
    }

    /// 保存配置到文件
    pub async fn save(&self) -> ConfigResult<()> {
        self.save_to(&self.path).await?;
        info!("Config saved to {:?}", self.path);
        Ok(())
    }

    /// 保存配置到指定路径
    pub async fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config = self.config.read().await;
        let content = serde_json::to_string_pretty(&*config)?;
        drop(config);

        // 确保父目录存在
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// 重新加载配置，校验失败时保留旧配置
    pub async fn reload(&self) -> ConfigResult<()> {
        Self::reload_into(&self.path, &self.config).await?;
        info!("Config reloaded from {:?}", self.path);
        Ok(())
    }

    /// 更新配置并保存
    pub async fn update<F>(&self, f: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut PpaConfig),
    {
        let mut config = self.config.write().await;
        let mut updated = config.clone();
        f(&mut updated);
        Self::validate(&updated)?;
        *config = updated;
        drop(config);
        self.save().await
    }

    /// 验证配置
    ///
    /// 默认 provider 必须存在，且每个 provider 的设置都要通过校验。
    pub fn validate(config: &PpaConfig) -> ConfigResult<()> {
        if !config.llm.providers.contains_key(&config.llm.default_provider) {
            return Err(ConfigError::Validation(format!(
                "Default LLM provider '{}' not found in providers list",
                config.llm.default_provider
            )));
        }

        let mut ids: Vec<&String> = config.llm.providers.keys().collect();
        ids.sort();

        let mut errors = Vec::new();
        for id in ids {
            let result = ProviderValidator::validate_config(&config.llm.providers[id]);
            errors.extend(
                result
                    .errors
                    .into_iter()
                    .map(|e| format!("provider '{}': {}", id, e)),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// 获取配置文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(path: &Path) -> ConfigResult<PpaConfig> {
        let content = tokio::fs::read_to_string(path).await?;
        let content = expand_env_vars(&content)?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn reload_into(path: &Path, config: &RwLock<PpaConfig>) -> ConfigResult<()> {
        if !path.exists() {
            return Err(ConfigError::InvalidPath(format!(
                "Config file not found: {:?}",
                path
            )));
        }

        let new_config = Self::read_file(path).await?;
        Self::validate(&new_config)?;

        *config.write().await = new_config;
        Ok(())
    }
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("path", &self.path)
            .finish()
    }
}

/// 展开环境变量 ${VAR} 或 ${VAR:-default}
pub(crate) fn expand_env_vars(content: &str) -> ConfigResult<String> {
    let re = Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| ConfigError::Validation(format!("Invalid env pattern: {}", e)))?;

    let mut result = String::with_capacity(content.len());
    let mut last = 0;

    for cap in re.captures_iter(content) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let var_expr = &cap[1];

        // 处理 ${VAR:-default} 语法
        let (var_name, default_value) = match var_expr.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (var_expr, None),
        };

        let replacement = match std::env::var(var_name) {
            Ok(val) => val,
            Err(_) => match default_value {
                Some(default) => default.to_string(),
                None => return Err(ConfigError::EnvVarNotFound(var_name.to_string())),
            },
        };

        result.push_str(&content[last..full_match.start()]);
        result.push_str(&replacement);
        last = full_match.end();
    }

    result.push_str(&content[last..]);
    Ok(result)
}

#[cfg(feature = "hot-reload")]
impl ConfigManager {
    /// 启动热重载监听，须在 tokio runtime 内调用
    pub fn watch<F>(&mut self, callback: F) -> ConfigResult<()>
    where
        F: Fn() + Send + 'static,
    {
        use notify::{
            Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Result as NotifyResult,
            Watcher,
        };
        use std::sync::mpsc::channel;
        use std::thread;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ConfigError::InvalidPath(format!("No tokio runtime for watcher: {}", e)))?;
        let path = self.path.clone();
        let config = Arc::clone(&self.config);

        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: NotifyResult<Event>| {
                if let Ok(event) = res {
                    if event.kind.is_modify() {
                        let _ = tx.send(());
                    }
                }
            },
            NotifyConfig::default(),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        self.watcher = Some(Arc::new(std::sync::Mutex::new(watcher)));

        // 在后台线程中监听文件变化
        thread::spawn(move || {
            while rx.recv().is_ok() {
                debug!("Config file changed, reloading...");

                match runtime.block_on(Self::reload_into(&path, &config)) {
                    Ok(()) => {
                        info!("Config hot-reloaded successfully");
                        callback();
                    }
                    Err(e) => {
                        warn!("Failed to hot-reload config: {}", e);
                    }
                }
            }
        });

        info!("Started watching config file: {:?}", self.path);
        Ok(())
    }

    /// 停止热重载监听
    pub fn unwatch(&mut self) -> ConfigResult<()> {
        if let Some(watcher) = self.watcher.take() {
            use notify::Watcher;
            if let Ok(mut w) = watcher.lock() {
                w.unwatch(&self.path)?;
            }
            info!("Stopped watching config file");
        }
        Ok(())
    }

    /// 是否正在监听
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }
}
