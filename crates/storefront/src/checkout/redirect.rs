//! Payment redirect handling.
//!
//! Order creation may hand back either a plain URL (GET-style redirect) or a
//! form descriptor the client must POST. For the form case the engine
//! renders a self-submitting HTML document the shell navigates to; leaving
//! the page is the terminal, non-reversible side effect of checkout.

use driftmarket_core::OrderId;

use crate::api::types::{CheckoutResponse, PaymentForm};

/// What the shell must do after a successful order submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Navigate to a document that auto-submits a form POST to the provider.
    RedirectForm { order_id: OrderId, html: String },
    /// Navigate to the provider's payment URL.
    Redirect { order_id: OrderId, url: String },
    /// No off-site hop required; show the confirmation in place.
    Confirmed { order_id: OrderId },
}

impl CheckoutOutcome {
    /// Interpret an order-creation response.
    ///
    /// Exactly one redirect mechanism is present when payment requires an
    /// off-site hop; the form takes precedence if a confused backend ever
    /// sends both. Absence of both means the order is already finalized.
    #[must_use]
    pub fn from_response(response: CheckoutResponse) -> Self {
        let order_id = response.order_id;

        let Some(intent) = response.payment_intent else {
            return Self::Confirmed { order_id };
        };

        if let Some(form) = intent.payment_form {
            return Self::RedirectForm {
                order_id,
                html: render_payment_form(&form),
            };
        }

        if let Some(url) = intent.payment_url {
            return Self::Redirect { order_id, url };
        }

        Self::Confirmed { order_id }
    }
}

/// Render a self-submitting HTML form document for an off-site payment POST.
///
/// Every field becomes a hidden input; all attribute values are escaped.
/// The `noscript` button keeps the hop possible with scripting disabled.
#[must_use]
pub fn render_payment_form(form: &PaymentForm) -> String {
    let mut inputs = String::new();
    for (name, value) in &form.fields {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        inputs.push_str(&format!(
            "<input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
            escape_attr(name),
            escape_attr(&value)
        ));
    }

    format!(
        "<!doctype html>\n\
         <html>\n\
         <head><meta charset=\"utf-8\"><title>Redirecting to payment...</title></head>\n\
         <body onload=\"document.forms[0].submit()\">\n\
         <form action=\"{}\" method=\"{}\">\n\
         {}\
         <noscript><button type=\"submit\">Continue to payment</button></noscript>\n\
         </form>\n\
         </body>\n\
         </html>\n",
        escape_attr(&form.url),
        escape_attr(&form.method()),
        inputs
    )
}

/// Escape a string for use inside a double-quoted HTML attribute.
fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
