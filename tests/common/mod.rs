//! Shared fixtures for the integration tests. Payloads live in `tests_payload/`.
#![allow(dead_code)]

use requirement_butler::{config::Config, State};
use std::{io::Write, path::PathBuf};
use tempfile::NamedTempFile;

pub static XMLRPC_PATH: &str = "/lib/api/xmlrpc/v1/xmlrpc.php";
pub static DEV_KEY: &str = "5f4dcc3b5aa765d61d8327deb882cf99";

pub mod payload_template {
    pub static GITHUB_ISSUES_OPENED: &str =
        include_str!("../../tests_payload/github_issues_opened.json");
    pub static GITHUB_ISSUES_EDITED: &str =
        include_str!("../../tests_payload/github_issues_edited.json");
    pub static GITHUB_ISSUES_CLOSED: &str =
        include_str!("../../tests_payload/github_issues_closed.json");
    pub static GITHUB_ISSUES_REOPENED_UNTITLED: &str =
        include_str!("../../tests_payload/github_issues_reopened_untitled.json");
}

pub mod response_template {
    pub static CREATE_REQUIREMENT_OK: &str = r#"<?xml version="1.0"?>
<methodResponse>
  <params>
    <param>
      <value>
        <array><data>
          <value><struct>
            <member><name>status_ok</name><value><boolean>1</boolean></value></member>
            <member><name>msg</name><value><string>ok</string></value></member>
            <member><name>id</name><value><int>318</int></value></member>
          </struct></value>
        </data></array>
      </value>
    </param>
  </params>
</methodResponse>"#;

    pub static INVALID_PROJECT: &str = r#"<?xml version="1.0"?>
<methodResponse>
  <params>
    <param>
      <value>
        <array><data>
          <value><struct>
            <member><name>code</name><value><int>7000</int></value></member>
            <member><name>message</name><value><string>(createRequirement) - The Test Project ID (11) provided does not exist!</string></value></member>
          </struct></value>
        </data></array>
      </value>
    </param>
  </params>
</methodResponse>"#;

    pub static UNKNOWN_METHOD_FAULT: &str = r#"<?xml version="1.0"?>
<methodResponse>
  <fault>
    <value>
      <struct>
        <member><name>faultCode</name><value><int>-32601</int></value></member>
        <member><name>faultString</name><value><string>server error. requested method tl.createRequirement does not exist.</string></value></member>
      </struct>
    </value>
  </fault>
</methodResponse>"#;
}

/// Writes `contents` to a temporary file, the returned handle must be kept
/// alive while the payload is read.
pub fn payload_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

pub fn config(testlink_url: String, event_path: Option<PathBuf>) -> Config {
    Config {
        testlink_url,
        testlink_devkey: String::from(DEV_KEY),
        testlink_project_id: 11,
        testlink_reqspec_id: 22,
        event_path,
        repository: String::from("octo/widgets"),
        timeout: None,
    }
}

pub fn state(server_url: &str, event_path: Option<PathBuf>) -> State {
    State::new(config(format!("{}{}", server_url, XMLRPC_PATH), event_path)).unwrap()
}
