//! One WebSocket session of a notification client

use super::message::{Connect, Disconnect, NotificationPush};
use super::server::NotificationServer;
use super::{CLIENT_TIMEOUT, HEARTBEAT_INTERVAL};
use actix::*;
use actix_web_actors::ws;
use std::time::Instant;

pub struct NotificationConnection {
    /// Assigned by the server once registered
    id: Option<usize>,
    user_id: i32,
    last_heartbeat: Instant,
    server: Addr<NotificationServer>,
}

impl NotificationConnection {
    pub fn new(user_id: i32, server: Addr<NotificationServer>) -> Self {
        Self {
            id: None,
            user_id,
            last_heartbeat: Instant::now(),
            server,
        }
    }

    fn leave(&mut self) {
        if let Some(id) = self.id.take() {
            self.server.do_send(Disconnect { id });
        }
    }

    fn heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > CLIENT_TIMEOUT {
                log::debug!("Push session of user {} timed out", act.user_id);
                act.leave();
                ctx.stop();
                return;
            }

            ctx.ping(b"");
        });
    }

    fn register(&self, ctx: &mut ws::WebsocketContext<Self>) {
        self.server
            .send(Connect {
                addr: ctx.address().recipient(),
                user_id: self.user_id,
            })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res {
                    Ok(id) => act.id = Some(id),
                    Err(e) => {
                        log::warn!("Push session of user {} not registered: {}", act.user_id, e);
                        ctx.stop();
                    }
                }
                fut::ready(())
            })
            .wait(ctx);
    }
}

impl Actor for NotificationConnection {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.heartbeat(ctx);
        self.register(ctx);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.leave();
        Running::Stop
    }
}

impl Handler<NotificationPush> for NotificationConnection {
    type Result = ();

    fn handle(&mut self, msg: NotificationPush, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

/// The socket is push-only; inbound traffic is limited to keep-alives and close.
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for NotificationConnection {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                log::debug!("Push session of user {} protocol error: {}", self.user_id, e);
                ctx.stop();
                return;
            }
        };

        match msg {
            ws::Message::Ping(data) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&data);
            }
            ws::Message::Pong(_) => self.last_heartbeat = Instant::now(),
            ws::Message::Text(text) if text.trim() == "ping" => {
                self.last_heartbeat = Instant::now();
                ctx.text(r#"{"type":"pong"}"#);
            }
            ws::Message::Text(_) | ws::Message::Binary(_) | ws::Message::Nop => {}
            ws::Message::Close(reason) => {
                ctx.close(reason);
                ctx.stop();
            }
            ws::Message::Continuation(_) => ctx.stop(),
        }
    }
}
