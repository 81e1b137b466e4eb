use std::sync::Arc;
use std::time::Duration;

use actix_web::web::{self, Bytes, Data, PayloadConfig};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use openssl::ssl::SslAcceptorBuilder;
use sd_notify::NotifyState;

use admingate_misc::api::{self, HealthResponse};
use admingate_misc::policy::HOME_PATH;

use crate::context::EdgeContext;
use crate::gate::{Gate, GateRequest};
use crate::response::Response;

/// The edge HTTP server: every inbound request goes through the gate
/// before any content is produced.
pub struct EdgeServer {
    ssl: Option<SslAcceptorBuilder>,
    ctx: Arc<EdgeContext>,

    keep_alive_secs: Option<u64>,
    workers: Option<u64>,

    bind: String,

    payload_limit_mib: Option<u64>,
}

impl EdgeServer {
    pub fn new(bind: String, ctx: Arc<EdgeContext>) -> Self {
        Self {
            ssl: None,
            ctx,
            keep_alive_secs: None,
            workers: None,
            bind,
            payload_limit_mib: None,
        }
    }

    pub fn set_ssl(&mut self, ssl: SslAcceptorBuilder) {
        self.ssl = Some(ssl);
    }

    pub fn set_keep_alive_secs(&mut self, keep_alive_secs: u64) {
        self.keep_alive_secs = Some(keep_alive_secs);
    }

    pub fn set_workers(&mut self, workers: u64) {
        self.workers = Some(workers);
    }

    pub fn set_payload_limit_mib(&mut self, payload_limit_mib: u64) {
        self.payload_limit_mib = Some(payload_limit_mib);
    }

    pub async fn run(mut self) -> Result<()> {
        let ctx = self.ctx.clone();
        let payload_limit_mib = self.payload_limit_mib;
        let mut srv = HttpServer::new(move || {
            let app = App::new().app_data(Data::new(ctx.clone()));
            let app = match payload_limit_mib {
                Some(mib) => app.app_data(PayloadConfig::new((mib * 1024 * 1024) as usize)),
                None => app,
            };
            app.service(web::resource(api::HEALTHZ_PATH).route(web::get().to(Self::handle_healthz)))
                .default_service(web::route().to(Self::handle_request))
        });

        if let Some(ssl) = self.ssl.take() {
            info!("Binding to https://{}", self.bind);
            srv = srv.bind_openssl(&self.bind, ssl).context("bind with ssl")?
        } else {
            warn!("Using HTTP (without SSL). THIS IS DANGEROUS, DO NOT USE IN PRODUCTION");
            info!("Binding to http://{}", self.bind);
            srv = srv.bind(&self.bind).context("bind without ssl")?
        };

        if let Some(keep_alive) = self.keep_alive_secs {
            srv = srv.keep_alive(Duration::from_secs(keep_alive));
        }
        if let Some(workers) = self.workers {
            srv = srv.workers(workers as usize);
        }

        sd_notify::notify(true, &[NotifyState::Ready]).context("notify systemd")?;
        info!("Starting edge server");
        srv.run().await.context("run server")?;

        info!("Server stopped by user");
        Ok(())
    }

    async fn handle_request(
        req: HttpRequest,
        body: Option<Bytes>,
        ctx: Data<Arc<EdgeContext>>,
    ) -> HttpResponse {
        let gate_req = Self::gate_request(&req);
        let gate = Gate::new(ctx.get_ref().clone());

        let decision = gate.authorize(&gate_req).await;
        if decision.passes() {
            return ctx.proxy.forward(&req, body).await.into();
        }

        let location = decision
            .location()
            .unwrap_or_else(|| HOME_PATH.to_string());
        Response::redirect(&location).into()
    }

    async fn handle_healthz() -> HttpResponse {
        let resp = HealthResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now().timestamp() as u64,
        };
        HttpResponse::Ok().json(resp)
    }

    fn gate_request(req: &HttpRequest) -> GateRequest {
        let info = req.connection_info();
        GateRequest {
            path: req.path().to_string(),
            query: req.query_string().to_string(),
            scheme: info.scheme().to_string(),
            host: info.host().to_string(),
            cookie: req
                .headers()
                .get(api::HEADER_COOKIE)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
        }
    }
}
