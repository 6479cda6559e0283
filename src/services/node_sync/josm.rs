//! Create nodes through the JOSM remote control interface
use super::NodeSyncService;
use crate::config::FromServiceConfig;
use crate::nodes::OsmNode;
use crate::Error;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;

/// Connection parameters for a running JOSM instance with remote control enabled
#[derive(Debug, FromServiceConfig)]
pub struct Josm {
    base_url: String,
    /// values <= 0 disable throttling
    requests_per_sec: f64,
    #[service_config(skip)]
    client: Client,
}

impl Josm {
    fn request_url(&self, node: &OsmNode) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("lat", &node.lat.to_string())
            .append_pair("lon", &node.lon.to_string())
            .append_pair("addtags", &node.tag_string())
            .finish();
        format!("{}/add_node?{}", self.base_url.trim_end_matches('/'), query)
    }
}

impl Default for Josm {
    fn default() -> Self {
        Josm {
            base_url: "http://localhost:8111".to_string(),
            requests_per_sec: -1.0,
            client: Client::new(),
        }
    }
}

impl NodeSyncService for Josm {
    fn add_node(&self, node: &OsmNode) -> Result<(), Box<dyn std::error::Error>> {
        let resp = self.client.get(&self.request_url(node)).send()?;
        if resp.status() == StatusCode::OK {
            Ok(())
        } else {
            let code = resp.status();
            Err(Box::new(Error::RequestError(
                code,
                format!("JOSM rejected node at {},{}", node.lat, node.lon),
            )))
        }
    }

    fn request_delay(&self) -> Option<Duration> {
        if self.requests_per_sec > 0.0 {
            Some(Duration::from_secs_f64(1.0 / self.requests_per_sec))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use serde_yaml::Value;

    #[test]
    fn request_url_encodes_tags() {
        let mut cfg = ServiceConfig::new("josm");
        cfg.set_parameter("base_url", Value::String("http://127.0.0.1:8111/".to_string()));
        let josm = Josm::from_config(&cfg).unwrap();

        let mut node = OsmNode::new(33.5, -97.25);
        node.set_tag("name", "Old Mill & Dam");
        node.set_tag("ref:US-TX:thc", "101");
        assert_eq!(
            josm.request_url(&node),
            "http://127.0.0.1:8111/add_node?lat=33.5&lon=-97.25\
             &addtags=name%3DOld+Mill+%26+Dam%7Cref%3AUS-TX%3Athc%3D101"
        );
    }

    #[test]
    fn throttle_is_optional() {
        assert_eq!(Josm::default().request_delay(), None);
        let mut cfg = ServiceConfig::new("josm");
        cfg.set_parameter("requests_per_sec", Value::from(4.0));
        let josm = Josm::from_config(&cfg).unwrap();
        assert_eq!(josm.request_delay(), Some(Duration::from_millis(250)));
    }
}
