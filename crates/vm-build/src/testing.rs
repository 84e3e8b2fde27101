use std::sync::Mutex;

use async_trait::async_trait;
use vm_driver::VmDriver;
use vm_driver::types::{CreateVmRequest, VmHandle};

use crate::ui::Ui;

mockall::mock! {
    pub Driver {}

    #[async_trait]
    impl VmDriver for Driver {
        async fn find_vm(&self, name: &str) -> vm_driver::Result<Option<VmHandle>>;
        async fn create_vm(&self, req: &CreateVmRequest) -> vm_driver::Result<VmHandle>;
        async fn destroy_vm(&self, vm: &VmHandle) -> vm_driver::Result<()>;
    }
}

/// Ui that keeps every message for later assertions.
#[derive(Default)]
pub struct RecordingUi {
    says: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingUi {
    pub fn says(&self) -> Vec<String> {
        self.says.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Ui for RecordingUi {
    fn say(&self, message: &str) {
        self.says.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}
