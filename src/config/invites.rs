use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Invites {
  /// Realms are served from `{slug}.{base_domain}`.
  ///
  /// **Environment variables**:
  /// - `BOBA_INVITES_BASE_DOMAIN`
  #[serde(default = "Invites::default_base_domain")]
  pub base_domain: String,
}

impl Default for Invites {
  fn default() -> Self {
    Self {
      base_domain: Self::default_base_domain(),
    }
  }
}

impl Invites {
  fn default_base_domain() -> String {
    "boba.social".into()
  }

  #[must_use]
  pub fn invite_url(&self, realm_slug: &str, nonce: &str) -> String {
    format!("https://{realm_slug}.{}/invites/{nonce}", self.base_domain)
  }
}
