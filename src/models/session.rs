use std::sync::atomic::{AtomicBool, Ordering};

/// 当前登录会话, 作为显式依赖传入各服务
#[derive(Debug)]
pub struct Session {
    pub user_id: String,
    pub gstin: Option<String>,
    terminated: AtomicBool,
}

impl Session {
    pub fn new(user_id: impl Into<String>, gstin: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            gstin: gstin.filter(|g| !g.trim().is_empty()),
            terminated: AtomicBool::new(false),
        }
    }

    /// 供货方州代码: GSTIN 前两位, 否则使用默认州
    pub fn supplier_state_code<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.gstin
            .as_deref()
            .and_then(|g| g.get(0..2))
            .unwrap_or(fallback)
    }

    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::SeqCst);
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}
