use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow};
use color::{AlphaColor, Srgb};
use euclid::default::Size2D;
use scene::{BouncePoint, Circle, Window};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Settings read from `config.json`; every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Matrix width in pixels.
    pub width: u32,
    /// Matrix height in pixels.
    pub height: u32,
    /// Delay between two frames.
    pub framerate_ms: u64,
    /// Writes the per-frame display dump to `debug.log` in the log directory.
    pub debug: bool,
    /// Elements of the window shown at startup.
    pub circles: Vec<CircleConfig>,
    /// Extra windows that can be brought to the foreground from the console.
    pub windows: BTreeMap<String, Vec<CircleConfig>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 64,
            height: 32,
            framerate_ms: 50,
            debug: false,
            circles: vec![
                CircleConfig::bouncing(6, 6, 4, "crimson"),
                CircleConfig::bouncing(30, 20, 3, "gold"),
                CircleConfig::bouncing(50, 10, 5, "deepskyblue"),
            ],
            windows: BTreeMap::from([(
                "still".to_owned(),
                vec![
                    CircleConfig::still(20, 16, 10, "rebeccapurple"),
                    CircleConfig::still(44, 16, 10, "#ffa50080"),
                ],
            )]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleConfig {
    pub x: i32,
    pub y: i32,
    pub radius: i32,
    /// Any CSS colour, e.g. `"red"`, `"#ff000080"` or `"rgb(0 128 255)"`.
    pub color: String,
    #[serde(default)]
    pub bounce: bool,
    /// Distance kept from the edges while bouncing, defaults to the radius.
    #[serde(default)]
    pub padding: Option<i32>,
}

impl CircleConfig {
    fn bouncing(x: i32, y: i32, radius: i32, color: &str) -> Self {
        Self {
            x,
            y,
            radius,
            color: color.to_owned(),
            bounce: true,
            padding: None,
        }
    }
    fn still(x: i32, y: i32, radius: i32, color: &str) -> Self {
        Self {
            bounce: false,
            ..Self::bouncing(x, y, radius, color)
        }
    }

    pub fn color(&self) -> Result<AlphaColor<Srgb>> {
        let parsed = color::parse_color(&self.color)
            .map_err(|err| anyhow!("invalid colour {:?}: {err}", self.color))?;
        Ok(parsed.to_alpha_color::<Srgb>())
    }

    /// Builds the circle, bouncing inside `bounds` when enabled.
    pub fn build(&self, bounds: Size2D<u32>) -> Result<Circle> {
        let circle = Circle::new(self.x, self.y, self.radius, self.color()?);
        if !self.bounce {
            return Ok(circle);
        }
        let padding = self.padding.unwrap_or(self.radius);
        Ok(circle.with_animation(BouncePoint::new(
            bounds.width as i32 - 1,
            bounds.height as i32 - 1,
            padding,
        )))
    }
}

impl Config {
    /// Reads the config from `path`, or from the user config directory when
    /// no path is given. A missing default file falls back to built-in
    /// settings, a missing explicit file is an error.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path, true),
            None => match default_path() {
                Some(path) => (path, false),
                None => {
                    debug!("no config directory available, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        if !explicit && !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::parse(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        if config.width == 0 || config.height == 0 {
            return Err(anyhow!(
                "matrix size must be non-zero, got {}x{}",
                config.width,
                config.height
            ));
        }
        Ok(config)
    }

    pub fn size(&self) -> Size2D<u32> {
        Size2D::new(self.width, self.height)
    }

    pub fn framerate(&self) -> Duration {
        Duration::from_millis(self.framerate_ms)
    }

    pub fn build_window(&self, circles: &[CircleConfig]) -> Result<Window> {
        let mut window = Window::new(self.size());
        for circle in circles {
            window.push(circle.build(self.size())?);
        }
        Ok(window)
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("matrix").join("config.json"))
}
