use crate::core::config::ProviderConfig;
use crate::core::geo::TileCoord;

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

/// URL template with `{s}`, `{z}`, `{x}` and `{y}` placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct UrlTemplate {
    template: String,
    subdomains: Vec<String>,
}

impl UrlTemplate {
    pub fn new(template: impl Into<String>, subdomains: Vec<String>) -> Self {
        Self {
            template: template.into(),
            subdomains,
        }
    }

    pub fn from_provider(provider: &ProviderConfig) -> Self {
        Self::new(provider.url_template.clone(), provider.subdomains.clone())
    }
}

impl TileSource for UrlTemplate {
    fn url(&self, coord: TileCoord) -> String {
        // Spread requests over the subdomains, the same tile always hits the same one
        let subdomain = if self.subdomains.is_empty() {
            ""
        } else {
            let idx = ((coord.x as usize) + (coord.y as usize)) % self.subdomains.len();
            self.subdomains[idx].as_str()
        };

        self.template
            .replace("{s}", subdomain)
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }
}
