//! Resource modules: one function per verb + path of the admin API.
//!
//! Everything here is a pass-through. Validation lives in the form types,
//! error reporting in the views.

pub mod automation;
pub mod drive;
pub mod logs;
pub mod manual_post;
pub mod pages;
pub mod prompts;

use crate::client::ApiClient;

pub use automation::AutomationApi;
pub use drive::DriveApi;
pub use logs::{LogFilter, LogsApi};
pub use manual_post::ManualPostApi;
pub use pages::PagesApi;
pub use prompts::PromptsApi;

impl ApiClient {
    pub fn pages(&self) -> PagesApi<'_> {
        PagesApi::new(self)
    }

    pub fn prompts(&self) -> PromptsApi<'_> {
        PromptsApi::new(self)
    }

    pub fn logs(&self) -> LogsApi<'_> {
        LogsApi::new(self)
    }

    pub fn automation(&self) -> AutomationApi<'_> {
        AutomationApi::new(self)
    }

    pub fn drive(&self) -> DriveApi<'_> {
        DriveApi::new(self)
    }

    pub fn manual_posts(&self) -> ManualPostApi<'_> {
        ManualPostApi::new(self)
    }
}
