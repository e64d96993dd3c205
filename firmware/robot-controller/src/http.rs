//! HTTP ingress and diagnostics.
//!
//! `/control?left=<int>&right=<int>` drives the car (body `OK`);
//! `/dist` and `/status` report telemetry and the motion state.
//! Handlers decode first and hold the motion lock only for the target
//! write or a snapshot read.

use esp_idf_svc::http::server::{
    Configuration as HttpConfig, EspHttpConnection, EspHttpServer, Request,
};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::{EspIOError, Write};
use esp_idf_sys::EspError;
use log::info;
#[cfg(feature = "drive")]
use log::warn;

use crate::state::{SharedMotion, SharedTelemetry};

#[cfg(feature = "drive")]
use crate::state::Clock;

#[cfg(feature = "drive")]
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
#[cfg(feature = "drive")]
use std::sync::{Arc, Mutex};

#[cfg(feature = "drive")]
pub type SharedLamp = Arc<Mutex<PinDriver<'static, AnyOutputPin, Output>>>;

fn respond(req: Request<&mut EspHttpConnection>, body: &str) -> Result<(), EspIOError> {
    let mut resp = req.into_ok_response()?;
    resp.write_all(body.as_bytes())?;
    Ok(())
}

#[cfg(feature = "drive")]
fn query_of(uri: &str) -> &str {
    uri.split_once('?').map_or("", |(_, q)| q)
}

pub fn start(
    motion: SharedMotion,
    telemetry: SharedTelemetry,
    #[cfg(feature = "drive")] clock: Clock,
    #[cfg(feature = "drive")] lamp: SharedLamp,
) -> Result<EspHttpServer<'static>, EspError> {
    let mut server = EspHttpServer::new(&HttpConfig::default())?;

    #[cfg(feature = "drive")]
    {
        let motion = motion.clone();
        server.fn_handler("/control", Method::Get, move |req| {
            let cmd = robot_motion::protocol::parse_control_query(query_of(req.uri()));
            motion.lock().unwrap().command(cmd, clock.now_ms());
            respond(req, "OK")
        })?;

        server.fn_handler("/light", Method::Get, move |req| {
            let on = query_of(req.uri())
                .split('&')
                .find_map(|p| p.strip_prefix("on="))
                .map_or(false, |v| v.trim() == "1");
            {
                let mut pin = lamp.lock().unwrap();
                let res = if on { pin.set_high() } else { pin.set_low() };
                if let Err(e) = res {
                    warn!("lamp GPIO write failed: {e}");
                }
            }
            respond(req, if on { "ON" } else { "OFF" })
        })?;
    }

    {
        let telemetry = telemetry.clone();
        server.fn_handler("/dist", Method::Get, move |req| {
            let distance = telemetry.lock().unwrap().distance;
            respond(req, &format!("{distance:.2}"))
        })?;
    }

    server.fn_handler("/status", Method::Get, move |req| {
        let body = status_body(&motion, &telemetry);
        respond(req, &body)
    })?;

    info!("HTTP server started on port 80");
    Ok(server)
}

#[cfg(feature = "drive")]
fn status_body(motion: &SharedMotion, telemetry: &SharedTelemetry) -> String {
    let (left, right) = motion.lock().unwrap().current();
    let distance = telemetry.lock().unwrap().distance;
    format!(r#"{{"left":{left},"right":{right},"distance":{distance:.2}}}"#)
}

#[cfg(feature = "arm")]
fn status_body(motion: &SharedMotion, _telemetry: &SharedTelemetry) -> String {
    let ctl = motion.lock().unwrap();
    let [base, shoulder, elbow, gripper] = ctl.current();
    let moving = ctl.is_moving();
    format!(
        r#"{{"base":{base:.2},"shoulder":{shoulder:.2},"elbow":{elbow:.2},"gripper":{gripper:.2},"moving":{moving}}}"#
    )
}
