pub mod custom_message;
pub mod template_service;
