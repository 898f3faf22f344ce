//! HTML rendering for the calculator page.
//!
//! The page is small enough that a template engine would be overkill; it is
//! assembled with `format!` and every user-controlled value goes through
//! [`escape_html`].

use std::fmt::Write;

use abacus_core::calculator::{CalculationResponse, Operation};
use serde::Deserialize;

/// Raw form fields as submitted by the browser.
///
/// Kept as strings so an invalid number can be echoed back in the form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalculatorForm {
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub num1: String,
    #[serde(default)]
    pub num2: String,
}

/// Result area of the page.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success(CalculationResponse),
    Error(String),
}

/// Everything needed to render one page.
#[derive(Debug, Clone, Default)]
pub struct PageView {
    pub backend_online: bool,
    pub degraded_reason: Option<String>,
    pub form: CalculatorForm,
    pub outcome: Option<Outcome>,
}

/// Escape `&`, `<`, `>`, `"` and `'` for safe inclusion in HTML text and
/// attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Human-readable label for the operation selector.
pub fn operation_label(operation: Operation) -> &'static str {
    match operation {
        Operation::Add => "Add (+)",
        Operation::Subtract => "Subtract (-)",
        Operation::Multiply => "Multiply (×)",
        Operation::Divide => "Divide (÷)",
        Operation::Power => "Power (^)",
        Operation::SquareRoot => "Square root (√)",
    }
}

/// Render the full calculator page.
pub fn render_page(view: &PageView) -> String {
    let mut body = String::new();

    if let Some(reason) = &view.degraded_reason {
        let _ = write!(
            body,
            r#"<div class="banner degraded">Running in degraded mode: {}</div>"#,
            escape_html(reason)
        );
    }

    let status = if view.backend_online {
        r#"<p class="status online">✅ API Connected</p>"#
    } else {
        r#"<p class="status offline">❌ Cannot connect to API server</p>"#
    };
    body.push_str(status);

    body.push_str(&render_form(&view.form));

    match &view.outcome {
        Some(Outcome::Success(response)) => {
            let _ = write!(
                body,
                r#"<div class="result success">Result: <strong>{}</strong></div>"#,
                response.result
            );
        }
        Some(Outcome::Error(message)) => {
            let _ = write!(
                body,
                r#"<div class="result error">Error: {}</div>"#,
                escape_html(message)
            );
        }
        None => {}
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Abacus Calculator</title>
<style>
body {{ font-family: sans-serif; max-width: 32rem; margin: 2rem auto; }}
.banner.degraded {{ background: #f59e0b; color: #fff; padding: .75rem; border-radius: .5rem; }}
.status.online {{ color: #10b981; }}
.status.offline {{ color: #ef4444; }}
.result {{ margin-top: 1rem; padding: .75rem; border-radius: .5rem; }}
.result.success {{ background: #ecfdf5; }}
.result.error {{ background: #fef2f2; }}
</style>
</head>
<body>
<h1>Abacus Calculator</h1>
{body}
</body>
</html>
"#
    )
}

fn render_form(form: &CalculatorForm) -> String {
    let mut options = String::new();
    for operation in Operation::ALL {
        let selected = if form.operation == operation.as_str() {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            options,
            r#"<option value="{}"{selected}>{}</option>"#,
            operation.as_str(),
            operation_label(operation)
        );
    }

    format!(
        r#"<form method="post" action="/calculate">
<label>Operation <select name="operation">{options}</select></label>
<label>First number <input name="num1" value="{}" required></label>
<label>Second number <input name="num2" value="{}"></label>
<button type="submit">Calculate</button>
</form>"#,
        escape_html(&form.num1),
        escape_html(&form.num2)
    )
}
