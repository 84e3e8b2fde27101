/// Sink for user-facing progress and error messages.
pub trait Ui: Send + Sync + 'static {
    fn say(&self, message: &str);

    fn error(&self, message: &str);
}

/// Emits UI messages as tracing events tagged with the build name.
pub struct TracingUi {
    build: String,
}

impl TracingUi {
    pub fn new(build: impl Into<String>) -> Self {
        Self {
            build: build.into(),
        }
    }
}

impl Ui for TracingUi {
    fn say(&self, message: &str) {
        tracing::info!(build = %self.build, "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(build = %self.build, "{message}");
    }
}
