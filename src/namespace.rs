//! Process-wide backing-store configuration and the control messages that set it.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::GateError;
use crate::core::Result;

/// Where the files of every namespace live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NamespaceConfig {
    /// No initialization message has been received yet.
    #[default]
    Unset,
    Ready { base: String },
}

impl NamespaceConfig {
    /// An empty `base` means "not configured".
    pub fn from_base(base: &str) -> Self {
        let base = base.trim().trim_end_matches('/');
        if base.is_empty() {
            NamespaceConfig::Unset
        } else {
            NamespaceConfig::Ready {
                base: base.to_string(),
            }
        }
    }

    pub fn base(&self) -> Option<&str> {
        match self {
            NamespaceConfig::Unset => None,
            NamespaceConfig::Ready { base } => Some(base),
        }
    }
}

/// Out-of-band control message, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    #[serde(rename = "INIT_STORAGE")]
    InitStorage {
        #[serde(rename = "storageUrl", alias = "url")]
        storage_url: String,
    },
    #[serde(rename = "INIT_FIREBASE")]
    InitFirebase {
        #[serde(rename = "dbUrl")]
        db_url: String,
    },
}

impl ControlMessage {
    pub fn base(&self) -> &str {
        match self {
            ControlMessage::InitStorage { storage_url } => storage_url,
            ControlMessage::InitFirebase { db_url } => db_url,
        }
    }
}

/// Shared handle to the current [`NamespaceConfig`].
///
/// Clones share the same state. Reconfiguring while requests are in flight is allowed: a
/// request works with the snapshot it took when it started, and the last write wins.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    inner: Arc<RwLock<NamespaceConfig>>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: NamespaceConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Owned copy of the current configuration.
    pub fn snapshot(&self) -> NamespaceConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, config: NamespaceConfig) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Applies a control message. Repeated messages simply overwrite the base.
    pub fn apply(&self, message: ControlMessage) {
        let config = NamespaceConfig::from_base(message.base());
        match &message {
            ControlMessage::InitStorage { .. } if config != NamespaceConfig::Unset => {
                tracing::info!("storage base location set");
            }
            ControlMessage::InitFirebase { .. } if config != NamespaceConfig::Unset => {
                tracing::info!("document database base location set");
            }
            _ => tracing::warn!("control message carried an empty base location, namespace unset"),
        }
        self.set(config);
    }

    /// Decodes a JSON control message and applies it.
    pub fn apply_json(&self, text: &str) -> Result<()> {
        let message: ControlMessage =
            serde_json::from_str(text).map_err(|e| GateError::Control(e.to_string()))?;
        self.apply(message);
        Ok(())
    }

    /// Applies messages from `rx` until every sender is dropped.
    pub async fn listen(&self, mut rx: mpsc::Receiver<ControlMessage>) {
        while let Some(message) = rx.recv().await {
            self.apply(message);
        }
        tracing::debug!("control channel closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod config {
        use super::*;

        #[test]
        fn test_from_base() {
            assert_eq!(
                NamespaceConfig::from_base("https://db.example/"),
                NamespaceConfig::Ready {
                    base: "https://db.example".into()
                }
            );
            assert_eq!(NamespaceConfig::from_base(""), NamespaceConfig::Unset);
            assert_eq!(NamespaceConfig::from_base("  / "), NamespaceConfig::Unset);
        }

        #[test]
        fn test_default_is_unset() {
            let ns = Namespace::new();
            assert_eq!(ns.snapshot(), NamespaceConfig::Unset);
            assert_eq!(ns.snapshot().base(), None);
        }
    }

    mod control {
        use super::*;

        #[test]
        fn test_decode_messages() {
            let msg: ControlMessage =
                serde_json::from_str(r#"{"type":"INIT_FIREBASE","dbUrl":"https://db.example"}"#)
                    .unwrap();
            assert_eq!(
                msg,
                ControlMessage::InitFirebase {
                    db_url: "https://db.example".into()
                }
            );

            let msg: ControlMessage =
                serde_json::from_str(r#"{"type":"INIT_STORAGE","storageUrl":"https://s3.example/b"}"#)
                    .unwrap();
            assert_eq!(msg.base(), "https://s3.example/b");

            let msg: ControlMessage =
                serde_json::from_str(r#"{"type":"INIT_STORAGE","url":"https://s3.example/c"}"#)
                    .unwrap();
            assert_eq!(msg.base(), "https://s3.example/c");
        }

        #[test]
        fn test_apply_overwrites() {
            let ns = Namespace::new();
            ns.apply_json(r#"{"type":"INIT_FIREBASE","dbUrl":"https://one.example"}"#)
                .unwrap();
            ns.apply_json(r#"{"type":"INIT_STORAGE","storageUrl":"https://two.example/"}"#)
                .unwrap();
            assert_eq!(ns.snapshot().base(), Some("https://two.example"));
        }

        #[test]
        fn test_apply_empty_base_unsets() {
            let ns = Namespace::with_config(NamespaceConfig::from_base("https://one.example"));
            ns.apply(ControlMessage::InitFirebase { db_url: String::new() });
            assert_eq!(ns.snapshot(), NamespaceConfig::Unset);
        }

        #[test]
        fn test_reject_unknown_type() {
            let ns = Namespace::new();
            let err = ns
                .apply_json(r#"{"type":"REGISTER_FOLDER","itemId":"x","files":[]}"#)
                .unwrap_err();
            assert!(matches!(err, GateError::Control(_)));
            assert_eq!(ns.snapshot(), NamespaceConfig::Unset);
        }

        #[test]
        fn test_clones_share_state() {
            let ns = Namespace::new();
            let other = ns.clone();
            other.apply(ControlMessage::InitStorage {
                storage_url: "mem://store".into(),
            });
            assert_eq!(ns.snapshot().base(), Some("mem://store"));
        }

        #[tokio::test]
        async fn test_listen_applies_until_closed() {
            let ns = Namespace::new();
            let (tx, rx) = mpsc::channel(4);
            tx.send(ControlMessage::InitStorage {
                storage_url: "mem://first".into(),
            })
            .await
            .unwrap();
            tx.send(ControlMessage::InitFirebase {
                db_url: "mem://second".into(),
            })
            .await
            .unwrap();
            drop(tx);

            ns.listen(rx).await;
            assert_eq!(ns.snapshot().base(), Some("mem://second"));
        }
    }
}
