//! HTML views: the input form, the result page and the error page.

use crate::inference::{DISPLAY_DECIMALS, Inference, round_to};
use crate::schema::{FeatureImportance, FeatureKind, FeatureSchema};

const STYLE: &str = "  <style>\n    body { font-family: ui-sans-serif, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 24px auto; max-width: 640px; color: #1d2433; }\n    h1 { margin: 0 0 16px; }\n    .row { margin: 8px 0; }\n    .row label { display: inline-block; min-width: 200px; }\n    .prediction { font-size: 32px; font-weight: 600; }\n    .muted { color: #6b7489; }\n    .error { border-left: 5px solid #ef4565; padding: 8px 12px; background: #fdf0f2; }\n    table { border-collapse: collapse; margin-top: 12px; }\n    td, th { padding: 4px 12px; text-align: left; border-bottom: 1px solid #e3e7ef; }\n    a { color: #2f5bd3; }\n  </style>\n";

fn html_escape(value: &str) -> String {
    v_htmlescape::escape(value).to_string()
}

/// Shortest text for `value`, always with a decimal point: `3.0`, `2.5`, `3.457`.
fn format_decimal(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

fn open_page(title: &str) -> String {
    let mut html = String::new();
    html.push_str(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
    );
    html.push_str(&format!("  <title>{}</title>\n", html_escape(title)));
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(title)));
    html
}

fn close_page(mut html: String) -> String {
    html.push_str("</body>\n</html>\n");
    html
}

/// The input form: a text input per numeric feature and a checkbox per
/// boolean feature, in schema order.
pub fn render_form(title: &str, schema: &FeatureSchema) -> String {
    let mut html = open_page(title);
    html.push_str("<form method=\"post\" action=\"/predict\">\n");

    for column in schema.columns() {
        let name = html_escape(&column.name);
        let input = match column.kind {
            FeatureKind::Numeric => {
                format!("<input type=\"text\" inputmode=\"decimal\" id=\"{name}\" name=\"{name}\">")
            }
            FeatureKind::Boolean => {
                format!("<input type=\"checkbox\" id=\"{name}\" name=\"{name}\">")
            }
        };
        html.push_str(&format!(
            "<div class=\"row\"><label for=\"{name}\">{name}</label>{input}</div>\n"
        ));
    }

    html.push_str("<div class=\"row\"><button type=\"submit\">Predict</button></div>\n");
    html.push_str("</form>\n");
    close_page(html)
}

/// The result page: rounded prediction, the ensemble spread when known and the
/// ranked feature importances when the model has them.
pub fn render_result(
    title: &str,
    inference: &Inference,
    importances: Option<&[FeatureImportance]>,
) -> String {
    let mut html = open_page(title);

    html.push_str(&format!(
        "<div class=\"row\">Predicted value</div>\n<div class=\"prediction\">{}</div>\n",
        format_decimal(inference.rounded_prediction())
    ));

    match inference.dispersion {
        Some(dispersion) => html.push_str(&format!(
            "<div class=\"row\">Uncertainty (std. dev. across ensemble): &plusmn; {}</div>\n",
            format_decimal(round_to(dispersion, DISPLAY_DECIMALS))
        )),
        None => html.push_str(
            "<div class=\"row muted\">Uncertainty estimate not available for this model.</div>\n",
        ),
    }

    if let Some(importances) = importances {
        html.push_str("<h2>Feature importances</h2>\n<table>\n");
        html.push_str("<tr><th>Feature</th><th>Importance</th></tr>\n");
        for entry in importances {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{:.4}</td></tr>\n",
                html_escape(&entry.name),
                entry.weight
            ));
        }
        html.push_str("</table>\n");
    }

    html.push_str("<p><a href=\"/\">Make another prediction</a></p>\n");
    close_page(html)
}

/// The error page. `message` is shown verbatim, escaped.
pub fn render_error(title: &str, message: &str) -> String {
    let mut html = open_page(title);
    html.push_str(&format!(
        "<div class=\"error\"><strong>Prediction failed:</strong> {}</div>\n",
        html_escape(message)
    ));
    html.push_str("<p><a href=\"/\">Back to the form</a></p>\n");
    close_page(html)
}
