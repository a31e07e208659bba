use serde::Deserialize;

const DEFAULT_CONTAINER: &str = "map";
const DEFAULT_FOLLOW_ZOOM: f64 = 16.0;
const DEFAULT_FIT_PADDING_PX: f64 = 32.0;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Container the surface mounts into.
    pub container: String,
    /// Zoom used when flying to a newly selected vehicle.
    pub follow_zoom: f64,
    /// Padding around the one-time fit to bounds.
    pub fit_padding_px: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            container: DEFAULT_CONTAINER.to_owned(),
            follow_zoom: DEFAULT_FOLLOW_ZOOM,
            fit_padding_px: DEFAULT_FIT_PADDING_PX,
        }
    }
}
