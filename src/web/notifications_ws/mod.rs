//! Real-time notification push over WebSocket
//!
//! - `NotificationServer` tracks live sessions per user and implements
//!   `PushChannel`, so the `NotificationHub` can publish through it
//! - `NotificationConnection` is one client socket
//!
//! Clients connect to `GET /notifications.ws`. Identity comes from the
//! `X-User-Id` header set by the authenticating proxy in front of the
//! service. Each stored notification arrives as
//! `{"type":"notification","data":{...}}`.

pub mod connection;
pub mod message;
pub mod server;

use actix::Addr;
use actix_web::{error, get, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use std::time::Duration;

pub use message::PublishNotification;
pub use server::NotificationServer;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "X-User-Id";

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Sessions silent for longer than this are dropped.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

pub fn configure(conf: &mut web::ServiceConfig) {
    conf.service(notifications_ws);
}

/// Authenticated user id of a request, if the proxy supplied a valid one.
pub fn user_id_from_request(req: &HttpRequest) -> Option<i32> {
    req.headers()
        .get(USER_ID_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
}

#[get("/notifications.ws")]
pub async fn notifications_ws(
    req: HttpRequest,
    stream: web::Payload,
    server: web::Data<Addr<NotificationServer>>,
) -> Result<HttpResponse, Error> {
    let user_id = user_id_from_request(&req)
        .ok_or_else(|| error::ErrorUnauthorized("Missing or invalid user id"))?;

    log::debug!("User {} opening notification socket", user_id);

    let connection = connection::NotificationConnection::new(user_id, server.get_ref().clone());
    ws::start(connection, &req, stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_user_id_header() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, " 17 "))
            .to_http_request();
        assert_eq!(user_id_from_request(&req), Some(17));
    }

    #[test]
    fn test_bad_user_id_headers() {
        let missing = TestRequest::default().to_http_request();
        assert_eq!(user_id_from_request(&missing), None);

        for value in ["abc", "0", "-4", ""] {
            let req = TestRequest::default()
                .insert_header((USER_ID_HEADER, value))
                .to_http_request();
            assert_eq!(user_id_from_request(&req), None, "value {:?}", value);
        }
    }
}
