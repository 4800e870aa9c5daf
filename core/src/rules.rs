//! # Heuristic Rules
//!
//! Fallback matching for HTTP responses that no signature file covers.
//!
//! The table is evaluated top to bottom and the first matching entry wins, so
//! specific rules (e.g. Hikvision DVR) must stay above generic ones
//! (e.g. any GoAhead server).
//!
//! Only the RouterOS and `DVRDVS-Webs` entries are fixed requirements. The
//! rest is a curated list of common embedded web servers, ordered specific
//! before generic; reordering it changes which label a response gets.

use lift_common::models::HttpObservation;
use lift_protocols::http;

/// A condition on the observed title and server.
#[derive(Debug, Clone, Copy)]
pub enum Predicate {
    Title(&'static str),
    Server(&'static str),
    All(&'static [Predicate]),
    Any(&'static [Predicate]),
}

impl Predicate {
    pub fn matches(&self, title: &str, server: &str) -> bool {
        match self {
            Predicate::Title(text) => title.contains(text),
            Predicate::Server(text) => server.contains(text),
            Predicate::All(predicates) => predicates.iter().all(|p| p.matches(title, server)),
            Predicate::Any(predicates) => predicates.iter().any(|p| p.matches(title, server)),
        }
    }
}

/// Pulls a version token out of the response body.
pub type Extractor = fn(&str) -> Option<String>;

#[derive(Debug, Clone, Copy)]
pub struct HeuristicRule {
    pub predicate: Predicate,
    pub label: &'static str,
    pub extractor: Option<Extractor>,
}

const fn rule(predicate: Predicate, label: &'static str) -> HeuristicRule {
    HeuristicRule {
        predicate,
        label,
        extractor: None,
    }
}

use Predicate::{All, Any, Server, Title};

pub static HEURISTIC_RULES: &[HeuristicRule] = &[
    HeuristicRule {
        predicate: Title("RouterOS"),
        label: "MikroTik RouterOS",
        extractor: Some(routeros_version),
    },
    rule(Server("DVRDVS-Webs"), "Hikvision-based DVR"),
    rule(Server("Hikvision-Webs"), "Hikvision Device"),
    rule(Server("App-webs/"), "Hikvision Device"),
    rule(Server("DNVRS-Webs"), "Hikvision NVR"),
    rule(Server("uc-httpd"), "XiongMai Technologies-based DVR/NVR/IP Camera"),
    rule(Title("NETSurveillance WEB"), "XiongMai NETSurveillance DVR/NVR"),
    rule(All(&[Title("Web Service"), Server("Boa")]), "Dahua-based DVR (Boa)"),
    rule(Title("WEB SERVICE"), "Dahua Web Service Device"),
    rule(Server("DahuaHttp"), "Dahua Device"),
    rule(Title("NetDvrV3"), "NetDvrV3-based DVR"),
    rule(Title("IVSWeb"), "IVSWeb-based DVR"),
    rule(Title("DVR Components Download"), "Generic DVR (ActiveX components page)"),
    rule(Title("Web Viewer for Samsung DVR"), "Samsung DVR"),
    rule(Server("AV-TECH AV787 Video Web Server"), "AVTECH IP Camera/DVR"),
    rule(Server("Avtech"), "AVTECH Device"),
    rule(All(&[Title("IPCamera"), Server("GoAhead")]), "Generic GoAhead IP Camera"),
    rule(Server("GoAhead-Webs"), "GoAhead-based Embedded Device"),
    rule(Server("HuaweiHomeGateway"), "Huawei Home Gateway"),
    rule(Server("ZyXEL-RomPager"), "ZyXEL Device (RomPager)"),
    rule(Server("RomPager"), "Allegro RomPager Embedded Device"),
    rule(Server("micro_httpd"), "micro_httpd Embedded Device"),
    rule(Server("mini_httpd"), "mini_httpd Embedded Device"),
    rule(Server("axhttpd"), "IntelBras WOM500 (axhttpd)"),
    rule(All(&[Server("lighttpd"), Title("AirOS")]), "Ubiquiti AirOS Device"),
    rule(Title("airOS"), "Ubiquiti AirOS Device"),
    rule(Title("Synology"), "Synology DiskStation NAS"),
    rule(Title("QNAP"), "QNAP NAS"),
    rule(Any(&[Title("Login - iDRAC"), Title("iDRAC")]), "Dell iDRAC"),
    rule(Server("ATEN HTTP Server"), "Supermicro IPMI (ATEN)"),
    rule(Title("Supermicro"), "Supermicro IPMI"),
    rule(Any(&[Title("HP Integrated Lights-Out"), Server("HP-iLO-Server")]), "HPE iLO"),
    rule(Server("Check Point SVN foundation"), "Check Point Firewall"),
    rule(Server("SonicWALL"), "SonicWALL Firewall"),
    rule(Title("pfSense"), "pfSense Firewall"),
    rule(Title("DD-WRT"), "DD-WRT Router"),
    rule(Title("Tomato"), "Tomato Router Firmware"),
    rule(Title("Grandstream"), "Grandstream VoIP Device"),
    rule(Title("Polycom"), "Polycom VoIP Device"),
    rule(Server("Cisco AWARE"), "Cisco Device (AWARE)"),
    rule(Title("Open Webif"), "Open Webif Satellite Receiver"),
    rule(Server("ZK Web Server"), "ZKTeco Access Control Terminal"),
    rule(Any(&[Server("Web Switch"), Title("Web Smart Switch")]), "Managed Web Switch"),
    rule(Server("Virata-EmWeb"), "Virata EmWeb Embedded Device"),
    rule(Server("SQ-WEBCAM"), "SQ-WEBCAM IP Camera"),
];

/// Label of the first heuristic rule matching the observation, with any
/// extracted version appended.
pub fn identify(observation: &HttpObservation, body: &str) -> Option<String> {
    identify_with(HEURISTIC_RULES, observation, body)
}

pub fn identify_with(
    rules: &[HeuristicRule],
    observation: &HttpObservation,
    body: &str,
) -> Option<String> {
    let title = observation.title.as_deref().unwrap_or_default();
    let server = observation.server.as_deref().unwrap_or_default();

    let rule = rules.iter().find(|rule| rule.predicate.matches(title, server))?;

    let label = match rule.extractor.and_then(|extract| extract(body)) {
        Some(version) => format!("{} {}", rule.label, version),
        None => rule.label.to_string(),
    };
    Some(label)
}

/// Substitutes `{title}` and `{server}` in a signature label.
pub fn render_label(label: &str, observation: &HttpObservation) -> String {
    label
        .replace("{title}", observation.title.as_deref().unwrap_or_default())
        .replace("{server}", observation.server.as_deref().unwrap_or_default())
}

/// RouterOS login pages carry the version in their first heading,
/// e.g. `<h1>RouterOS v6.45.9</h1>`.
fn routeros_version(body: &str) -> Option<String> {
    let heading = http::first_heading(body)?;
    heading
        .split_whitespace()
        .find(|token| is_version(token))
        .map(str::to_string)
}

fn is_version(token: &str) -> bool {
    token
        .strip_prefix('v')
        .unwrap_or(token)
        .starts_with(|c: char| c.is_ascii_digit())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
