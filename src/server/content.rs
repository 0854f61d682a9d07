use parking_lot::RwLock;
use std::sync::Arc;

/// 根路徑回應的 HTML 文件
///
/// 寫入端整份替換 `Arc<str>`，讀取端只複製指標，因此請求處理中
/// 永遠看到完整的舊值或新值。
#[derive(Debug, Clone)]
pub struct SharedContent {
    inner: Arc<RwLock<Arc<str>>>,
}

impl SharedContent {
    pub fn new(initial: impl Into<Arc<str>>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial.into())),
        }
    }

    /// 替換內容並返回先前的值
    pub fn replace(&self, html: impl Into<Arc<str>>) -> Arc<str> {
        std::mem::replace(&mut *self.inner.write(), html.into())
    }

    /// 僅當目前內容仍是 `expected` 這份實例時才替換
    pub fn replace_if_current(&self, expected: &Arc<str>, html: impl Into<Arc<str>>) -> bool {
        let mut slot = self.inner.write();
        if Arc::ptr_eq(&*slot, expected) {
            *slot = html.into();
            true
        } else {
            false
        }
    }

    /// 取得當前內容
    pub fn snapshot(&self) -> Arc<str> {
        self.inner.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_replace_returns_previous() {
        let content = SharedContent::new("A");
        let previous = content.replace("B".to_string());

        assert_eq!(&*previous, "A");
        assert_eq!(&*content.snapshot(), "B");
        assert_eq!(content.len(), 1);
    }

    #[test]
    fn test_replace_if_current() {
        let content = SharedContent::new("A");
        let current = content.snapshot();

        assert!(content.replace_if_current(&current, "B"));
        // 已被替換，舊指標不再匹配
        assert!(!content.replace_if_current(&current, "C"));
        assert_eq!(&*content.snapshot(), "B");
    }

    #[test]
    fn test_clones_share_slot() {
        let content = SharedContent::new("placeholder");
        let reader = content.clone();

        content.replace("");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let content = SharedContent::new("old");
        let held = content.snapshot();
        content.replace("new");

        assert_eq!(&*held, "old");
        assert_eq!(&*content.snapshot(), "new");
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_values() {
        let a = "a".repeat(4096);
        let b = "b".repeat(4096);
        let content = SharedContent::new(a.clone());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let content = content.clone();
                let (a, b) = (a.clone(), b.clone());
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        let seen = content.snapshot();
                        assert!(*seen == *a || *seen == *b);
                    }
                })
            })
            .collect();

        for i in 0..1_000 {
            content.replace(if i % 2 == 0 { b.clone() } else { a.clone() });
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
