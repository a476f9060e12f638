//! Payload composition for common QR content types.
//!
//! These are plain string builders. Nothing is validated or escaped beyond
//! the percent-encoding that `mailto:` components require.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// Characters left alone by URI component encoding: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Network authentication advertised in a WiFi payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum WifiEncryption {
    #[default]
    #[serde(rename = "WPA")]
    Wpa,
    #[serde(rename = "WEP")]
    Wep,
    #[serde(rename = "nopass")]
    NoPass,
}

impl WifiEncryption {
    pub fn as_str(self) -> &'static str {
        match self {
            WifiEncryption::Wpa => "WPA",
            WifiEncryption::Wep => "WEP",
            WifiEncryption::NoPass => "nopass",
        }
    }
}

/// Content to encode.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    /// Free text or a URL, encoded verbatim.
    Text { text: String },
    Wifi {
        ssid: String,
        password: String,
        #[serde(default)]
        encryption: WifiEncryption,
    },
    /// A vCard 3.0 contact.
    Contact {
        name: String,
        phone: String,
        email: String,
        company: String,
    },
    Email { to: String, subject: String, body: String },
}

impl Payload {
    pub fn text(text: impl Into<String>) -> Self {
        Payload::Text { text: text.into() }
    }

    /// Renders the payload into the string handed to the encoder.
    pub fn compose(&self) -> String {
        match self {
            Payload::Text { text } => text.clone(),
            Payload::Wifi {
                ssid,
                password,
                encryption,
            } => format!("WIFI:T:{};S:{};P:{};;", encryption.as_str(), ssid, password),
            Payload::Contact {
                name,
                phone,
                email,
                company,
            } => format!(
                "BEGIN:VCARD\nVERSION:3.0\nFN:{}\nORG:{}\nTEL:{}\nEMAIL:{}\nEND:VCARD",
                name, company, phone, email
            ),
            Payload::Email { to, subject, body } => format!(
                "mailto:{}?subject={}&body={}",
                to,
                utf8_percent_encode(subject, URI_COMPONENT),
                utf8_percent_encode(body, URI_COMPONENT)
            ),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compose())
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::text(text)
    }
}
