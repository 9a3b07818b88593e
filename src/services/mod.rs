pub mod backend;
pub mod call;
pub mod history;
pub mod pipeline;
pub mod symptoms;
pub mod voice;
