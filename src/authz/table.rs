//! Markdown and plain-text renderings of least privilege information.

use std::fmt::Write as _;

use crate::authz::errors::AuthzError;
use crate::authz::resource::{LeastPrivilegeMap, PERMISSION_NOT_AVAILABLE, PERMISSION_NOT_SUPPORTED};
use crate::authz::types::{Method, SchemeType};
use crate::authz::AuthzState;

const HEADERS: [&str; 3] = [
    "Permission type",
    "Least privileged permissions",
    "Higher privileged permissions",
];

const TABLE_SCHEMES: [SchemeType; 3] = [
    SchemeType::DelegatedWork,
    SchemeType::DelegatedPersonal,
    SchemeType::Application,
];

#[derive(Debug, Default)]
struct MarkdownBuilder {
    out: String,
}

impl MarkdownBuilder {
    fn start_table(&mut self, headers: &[&str]) {
        self.add_row(headers);
        self.out.push('|');
        for _ in headers {
            self.out.push_str(":---|");
        }
        self.out.push('\n');
    }

    fn add_row(&mut self, cells: &[&str]) {
        self.out.push('|');
        self.out.push_str(&cells.join("|"));
        self.out.push_str("|\n");
    }

    fn end_table(&mut self) {
        self.out.push('\n');
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Render the permissions table for one operation.
///
/// Returns an empty string when the URL or method is unknown, or when a row
/// lists higher privileged permissions without a least privileged one. With
/// `generate_default`, an unknown operation yields a table of
/// "Not supported." cells instead.
pub fn generate_permissions_table(
    state: &AuthzState,
    url: &str,
    method: Method,
    generate_default: bool,
) -> Result<String, AuthzError> {
    let resource = state
        .find_resource(url)
        .filter(|resource| resource.schemes(method).is_some());
    let Some(resource) = resource else {
        tracing::debug!(url, %method, "no resource for permissions table");
        return Ok(if generate_default {
            default_table()
        } else {
            String::new()
        });
    };

    let mut markdown = MarkdownBuilder::default();
    markdown.start_table(&HEADERS);
    let mut all_rows_valid = true;
    for scheme in TABLE_SCHEMES {
        let summary = resource.privilege_summary(method, scheme)?;
        let least = summary.least_cell();
        let higher = summary.higher_cell();
        all_rows_valid &= row_is_valid(&least, &higher);
        markdown.add_row(&[scheme.display_name(), least.as_str(), higher.as_str()]);
    }
    markdown.end_table();

    if !all_rows_valid {
        tracing::warn!(url, %method, "higher privileged permissions without a least privileged one");
        return Ok(String::new());
    }
    Ok(markdown.finish())
}

fn default_table() -> String {
    let mut markdown = MarkdownBuilder::default();
    markdown.start_table(&HEADERS);
    for scheme in TABLE_SCHEMES {
        markdown.add_row(&[
            scheme.display_name(),
            PERMISSION_NOT_SUPPORTED,
            PERMISSION_NOT_SUPPORTED,
        ]);
    }
    markdown.end_table();
    markdown.finish()
}

fn row_is_valid(least: &str, higher: &str) -> bool {
    !(least.eq_ignore_ascii_case(PERMISSION_NOT_SUPPORTED)
        && !higher.eq_ignore_ascii_case(PERMISSION_NOT_SUPPORTED)
        && !higher.eq_ignore_ascii_case(PERMISSION_NOT_AVAILABLE))
}

/// Plain-text listing of a least privilege map:
///
/// ```text
/// GET
/// |Application |Foo.Read|
/// ```
pub fn format_least_privilege(map: &LeastPrivilegeMap) -> String {
    let mut out = String::new();
    for (method, schemes) in map {
        let _ = writeln!(out, "{method}");
        for (scheme, labels) in schemes {
            let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
            let _ = writeln!(out, "|{scheme} |{}|", labels.join(", "));
        }
    }
    out
}
