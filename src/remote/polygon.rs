// src/remote/polygon.rs

//! Thin Polygon session wrapper
//!
//! Fetches problem packages from the Polygon web interface by numeric
//! problem id. This is a shallow I/O collaborator: the pipeline only needs
//! "give me the latest package zip for this problem" and "list a contest's
//! problems", and everything here stays behind those two calls.

use crate::error::{Error, Result};
use crate::remote::auth;
use reqwest::blocking::Client;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default Polygon endpoint
pub const DEFAULT_POLYGON_URL: &str = "https://polygon.codeforces.com";

/// An authenticated Polygon web session
pub struct PolygonSession {
    client: Client,
    base_url: String,
}

impl PolygonSession {
    /// Log in with cached (or prompted) credentials
    pub fn login(base_url: &str) -> Result<Self> {
        let credentials = auth::load_or_prompt("polygon")?;
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(300))
            .build()?;

        let response = client
            .post(format!("{base_url}/login"))
            .form(&[
                ("login", credentials.login.as_str()),
                ("password", credentials.password.as_str()),
                ("submitted", "true"),
            ])
            .send()?;
        if !response.status().is_success() {
            return Err(Error::remote(format!(
                "polygon login failed with status {}",
                response.status()
            )));
        }
        info!("logged in to polygon");
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Problem ids of a contest, keyed by problem index (A, B, ...)
    pub fn contest_problems(&self, contest_id: u32) -> Result<BTreeMap<String, u32>> {
        let response = self
            .client
            .get(format!("{}/api/contest.problems", self.base_url))
            .query(&[("contestId", contest_id.to_string())])
            .send()?;
        let body: serde_json::Value = response.json()?;
        let problems = body
            .get("result")
            .and_then(|r| r.as_object())
            .ok_or_else(|| Error::remote("unexpected contest.problems response shape"))?;

        let mut map = BTreeMap::new();
        for (index, problem) in problems {
            let id = problem
                .get("id")
                .and_then(|id| id.as_u64())
                .ok_or_else(|| Error::remote(format!("problem {index} has no id")))?;
            map.insert(index.clone(), id as u32);
        }
        debug!(contest_id, problems = map.len(), "listed contest problems");
        Ok(map)
    }

    /// Download the latest full package of a problem into `dest_dir`
    ///
    /// Returns the path of the downloaded zip.
    pub fn download_last_package(&self, problem_id: u32, dest_dir: &Path) -> Result<PathBuf> {
        let mut response = self
            .client
            .get(format!(
                "{}/problem/{problem_id}/package/latest",
                self.base_url
            ))
            .query(&[("type", "linux")])
            .send()?;
        if !response.status().is_success() {
            return Err(Error::remote(format!(
                "package download for problem {problem_id} failed with status {}",
                response.status()
            )));
        }

        let path = dest_dir.join(format!("{problem_id}.zip"));
        let mut file = File::create(&path)?;
        response.copy_to(&mut file)?;
        info!(problem_id, path = %path.display(), "downloaded package");
        Ok(path)
    }
}
