pub mod notifications_ws;

/// Configures the web app by adding services from each web module.
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    notifications_ws::configure(conf);
}
