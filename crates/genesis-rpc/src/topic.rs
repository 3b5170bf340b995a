//! §4.3 topic naming: one logical request/reply pair per `service_name`.

pub fn request_topic(service_name: &str) -> String {
    format!("rpc/{service_name}_Request")
}

pub fn reply_topic(service_name: &str) -> String {
    format!("rpc/{service_name}_Reply")
}
