//! Light state and the aggregation used for synthesized channels.

use serde::{Deserialize, Serialize};

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// What is known about one logical light. Every field may be unknown
/// independently: on/off and brightness come from different notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    pub on: Option<bool>,
    pub rgb: Option<Rgb>,
    /// Brightness, 0..=100.
    pub luminance: Option<u8>,
}

impl LightState {
    /// Combine constituent lights into one: mean color, mean brightness,
    /// and on if any constituent is on. Unknown fields are skipped; a field
    /// unknown on every constituent stays unknown.
    pub fn aggregate<'a>(parts: impl IntoIterator<Item = &'a LightState>) -> Self {
        let mut on = None;
        let mut luminance = Mean::default();
        let mut red = Mean::default();
        let mut green = Mean::default();
        let mut blue = Mean::default();

        for part in parts {
            if let Some(value) = part.on {
                on = Some(on.unwrap_or(false) || value);
            }
            if let Some(value) = part.luminance {
                luminance.push(value);
            }
            if let Some(rgb) = part.rgb {
                red.push(rgb.red);
                green.push(rgb.green);
                blue.push(rgb.blue);
            }
        }

        let rgb = match (red.get(), green.get(), blue.get()) {
            (Some(r), Some(g), Some(b)) => Some(Rgb::new(r, g, b)),
            _ => None,
        };

        Self {
            on,
            rgb,
            luminance: luminance.get(),
        }
    }
}

#[derive(Default)]
struct Mean {
    sum: u32,
    count: u32,
}

impl Mean {
    fn push(&mut self, value: u8) {
        self.sum += u32::from(value);
        self.count += 1;
    }

    /// Rounded half up.
    fn get(&self) -> Option<u8> {
        if self.count == 0 {
            return None;
        }
        let mean = (self.sum + self.count / 2) / self.count;
        Some(u8::try_from(mean).unwrap_or(u8::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_average_brightness_and_or_on_flags() {
        let a = LightState {
            on: Some(true),
            rgb: None,
            luminance: Some(40),
        };
        let b = LightState {
            on: Some(true),
            rgb: None,
            luminance: Some(60),
        };
        let aggregate = LightState::aggregate([&a, &b]);
        assert_eq!(aggregate.luminance, Some(50));
        assert_eq!(aggregate.on, Some(true));
    }

    #[test]
    fn should_be_on_when_any_part_is_on() {
        let off = LightState {
            on: Some(false),
            ..LightState::default()
        };
        let on = LightState {
            on: Some(true),
            ..LightState::default()
        };
        assert_eq!(LightState::aggregate([&off, &on]).on, Some(true));
        assert_eq!(LightState::aggregate([&off, &off]).on, Some(false));
    }

    #[test]
    fn should_average_color_per_component() {
        let a = LightState {
            rgb: Some(Rgb::new(200, 0, 100)),
            ..LightState::default()
        };
        let b = LightState {
            rgb: Some(Rgb::new(100, 0, 50)),
            ..LightState::default()
        };
        assert_eq!(
            LightState::aggregate([&a, &b]).rgb,
            Some(Rgb::new(150, 0, 75))
        );
    }

    #[test]
    fn should_skip_unknown_fields() {
        let known = LightState {
            on: None,
            rgb: None,
            luminance: Some(70),
        };
        let unknown = LightState::default();
        let aggregate = LightState::aggregate([&known, &unknown]);
        assert_eq!(aggregate.luminance, Some(70));
        assert_eq!(aggregate.on, None);
        assert_eq!(aggregate.rgb, None);
    }
}
