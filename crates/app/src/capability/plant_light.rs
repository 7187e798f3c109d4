//! Two-light plant lamp driven through raw luminance channels.
//!
//! The lamp reports one luminance channel per LED colour. Logical light
//! `n` (1 or 2) owns the physical block starting at `4n - 1`: white, blue
//! and red at offsets 0, 1 and 2. White carries the light's brightness;
//! red and blue are scaled by it. There is no green LED.
//!
//! Channel 0 is synthetic: it aggregates lights 1 and 2 and is recomputed
//! whenever either of them changes.

use std::collections::BTreeMap;
use std::time::Duration;

use capahub_domain::ability::ns;
use capahub_domain::channel::{Channel, ChannelInfo};
use capahub_domain::error::{CapaHubError, ValidationError};
use capahub_domain::light::{LightState, Rgb};
use capahub_domain::observation::{ChannelStates, Observation, Source};
use serde_json::{Value, json};

use super::luminance::{MAX_LUMINANCE, control_payload, luminance_request};
use super::{DispatchContext, Handler, Luminance, PollRequest, ToggleX};
use crate::device::Device;
use crate::ports::{Method, Transport};

const LIGHTS: [Channel; 2] = [Channel::new(1), Channel::new(2)];

const WHITE_OFFSET: u16 = 0;
const BLUE_OFFSET: u16 = 1;
const RED_OFFSET: u16 = 2;

/// Physical channels read during a full poll.
const POLLED_CHANNELS: std::ops::Range<u16> = 3..11;

fn physical(light: Channel, offset: u16) -> Channel {
    Channel::new(light.index() * 4 - 1 + offset)
}

/// Raw LED level for `component` at `luminance`.
fn encode(component: u8, luminance: u8) -> u8 {
    let scaled = u32::from(component) * u32::from(luminance) / 255;
    u8::try_from(scaled).unwrap_or(u8::MAX)
}

/// Colour component back from a raw LED level. Undefined at zero
/// brightness.
fn decode(raw: u8, luminance: u8) -> Option<u8> {
    if luminance == 0 {
        return None;
    }
    let luminance = u32::from(luminance);
    let component = (u32::from(raw) * 255 + luminance / 2) / luminance;
    Some(u8::try_from(component).unwrap_or(u8::MAX))
}

/// Requested changes for one light. `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightCommand {
    pub on: Option<bool>,
    pub rgb: Option<Rgb>,
    pub luminance: Option<u8>,
}

/// Logical light states synthesized from the lamp's switching and
/// luminance channels.
#[derive(Debug, Clone, Default)]
pub struct PlantLight {
    lights: ChannelStates<LightState>,
}

impl PlantLight {
    #[must_use]
    pub fn light(&self, channel: Channel) -> Option<LightState> {
        self.lights.copied(channel)
    }

    #[must_use]
    pub fn observed(&self, channel: Channel) -> Option<&Observation<LightState>> {
        self.lights.get(channel)
    }

    /// The lamp's abilities do not describe its lights; its layout is fixed.
    pub(crate) fn remap_channels(&self, _discovered: &[ChannelInfo]) -> Vec<ChannelInfo> {
        vec![
            ChannelInfo::new(0u16, Some("Main Channel"), true),
            ChannelInfo::new(1u16, Some("Light A"), false),
            ChannelInfo::new(2u16, Some("Light B"), false),
        ]
    }

    pub(crate) fn poll_request(&self) -> PollRequest {
        PollRequest::get(
            ns::CONTROL_LUMINANCE,
            luminance_request(POLLED_CHANNELS.map(Channel::new)),
        )
    }

    /// Rebuild lights 1 and 2 from their constituents, then the aggregate.
    pub(crate) fn recompute(
        &mut self,
        toggles: Option<&ChannelStates<bool>>,
        luminance: Option<&ChannelStates<u8>>,
        source: Source,
    ) {
        for light in LIGHTS {
            let previous = self.lights.copied(light).unwrap_or_default();
            let raw = |offset| luminance.and_then(|l| l.copied(physical(light, offset)));

            let level = raw(WHITE_OFFSET).or(previous.luminance);
            let rgb = match (level, raw(RED_OFFSET), raw(BLUE_OFFSET)) {
                (Some(level), Some(red), Some(blue)) => {
                    let unchanged = previous
                        .rgb
                        .is_some_and(|p| encode(p.red, level) == red && encode(p.blue, level) == blue);
                    if unchanged {
                        previous.rgb
                    } else {
                        match (decode(red, level), decode(blue, level)) {
                            (Some(red), Some(blue)) => Some(Rgb::new(red, 0, blue)),
                            _ => previous.rgb,
                        }
                    }
                }
                _ => previous.rgb,
            };
            let on = toggles.and_then(|t| t.copied(light)).or(previous.on);

            let next = LightState {
                on,
                rgb,
                luminance: level,
            };
            if next != LightState::default() {
                self.lights.observe(light, next, source);
            }
        }
        self.refresh_main(source);
    }

    /// Record exactly what was requested for `light`, keeping its on/off.
    pub(crate) fn override_light(&mut self, light: Channel, rgb: Option<Rgb>, luminance: u8, source: Source) {
        let previous = self.lights.copied(light).unwrap_or_default();
        let next = LightState {
            on: previous.on,
            rgb: rgb.map(|c| Rgb::new(c.red, 0, c.blue)).or(previous.rgb),
            luminance: Some(luminance),
        };
        self.lights.observe(light, next, source);
        self.refresh_main(source);
    }

    fn refresh_main(&mut self, source: Source) {
        let parts: Vec<LightState> = LIGHTS.iter().filter_map(|l| self.lights.copied(*l)).collect();
        if parts.is_empty() {
            return;
        }
        let main = LightState::aggregate(parts.iter());
        self.lights.observe(Channel::MAIN, main, source);
    }
}

impl Handler for PlantLight {
    fn handle_push(&mut self, _: &str, _: &Value, _: &DispatchContext<'_>) -> bool {
        false
    }

    fn handle_update(&mut self, _: &str, _: &Value, _: &DispatchContext<'_>) -> bool {
        false
    }
}

impl<T> Device<T> {
    /// Synthesized state of a plant lamp light; channel 0 is the aggregate.
    #[must_use]
    pub fn light(&self, channel: Channel) -> Option<LightState> {
        self.read(|p: &PlantLight| p.light(channel)).flatten()
    }
}

impl<T: Transport> Device<T> {
    /// Drive one plant lamp light, or both through channel 0.
    ///
    /// On/off goes through the switching capability; colour and brightness
    /// are sent as one luminance bulk set per light. Brightness defaults to
    /// the cached value, then to full. Cached state is written only once
    /// every command of the call has been confirmed.
    ///
    /// # Errors
    ///
    /// [`ValidationError::ChannelOutOfRange`] for channels above 2,
    /// [`ValidationError::LuminanceOutOfRange`], [`CapaHubError::Unsupported`]
    /// on other devices, or the first failing command.
    #[tracing::instrument(skip(self), fields(device = %self.uuid()))]
    pub async fn set_light_color(
        &self,
        channel: Channel,
        command: LightCommand,
        timeout: Option<Duration>,
    ) -> Result<(), CapaHubError> {
        self.require::<PlantLight>()?;
        let targets: &[Channel] = match channel.index() {
            0 => &LIGHTS,
            1 => &LIGHTS[..1],
            2 => &LIGHTS[1..],
            other => {
                return Err(ValidationError::ChannelOutOfRange {
                    channel: other,
                    operation: "set_light_color",
                }
                .into());
            }
        };
        if let Some(luminance) = command.luminance.filter(|l| *l > MAX_LUMINANCE) {
            return Err(ValidationError::LuminanceOutOfRange(u16::from(luminance)).into());
        }

        if command.on.is_some() && !self.has::<ToggleX>() {
            return Err(self.unsupported::<ToggleX>());
        }
        self.require::<Luminance>()?;

        let plans: Vec<LightPlan> = targets
            .iter()
            .map(|light| self.plan_light(*light, command))
            .collect();

        for plan in &plans {
            if let Some(on) = command.on {
                let payload = json!({"togglex": {"onoff": i64::from(on), "channel": plan.light.index()}});
                self.execute(Method::Set, ns::CONTROL_TOGGLEX, payload, timeout).await?;
            }
            let payload = control_payload(&plan.values)?;
            self.execute(Method::Set, ns::CONTROL_LUMINANCE, payload, timeout).await?;
        }

        // every command is confirmed; nothing was written before this point
        let namespaces: &[&str] = if command.on.is_some() {
            &[ns::CONTROL_TOGGLEX, ns::CONTROL_LUMINANCE]
        } else {
            &[ns::CONTROL_LUMINANCE]
        };
        self.commit_all(namespaces, |set| {
            if let (Some(on), Some(toggles)) = (command.on, set.get_mut::<ToggleX>()) {
                for plan in &plans {
                    toggles.set(plan.light, on, Source::Optimistic);
                }
            }
            if let Some(luminance) = set.get_mut::<Luminance>() {
                for (channel, value) in plans.iter().flat_map(|p| &p.values) {
                    luminance.set(*channel, *value, Source::Optimistic);
                }
            }
            if let Some(plant) = set.get_mut::<PlantLight>() {
                for plan in &plans {
                    plant.override_light(plan.light, command.rgb, plan.luminance, Source::Optimistic);
                }
            }
        });
        Ok(())
    }

    /// Raw LED levels for one light, from the request and cached state.
    fn plan_light(&self, light: Channel, command: LightCommand) -> LightPlan {
        let cached = self.light(light).unwrap_or_default();
        let luminance = command
            .luminance
            .or(cached.luminance)
            .unwrap_or(MAX_LUMINANCE);
        let rgb = command.rgb.or(cached.rgb);

        let mut values = BTreeMap::from([(physical(light, WHITE_OFFSET), luminance)]);
        if let Some(rgb) = rgb {
            values.insert(physical(light, RED_OFFSET), encode(rgb.red, luminance));
            values.insert(physical(light, BLUE_OFFSET), encode(rgb.blue, luminance));
        }
        LightPlan {
            light,
            luminance,
            values,
        }
    }
}

struct LightPlan {
    light: Channel,
    luminance: u8,
    values: BTreeMap<Channel, u8>,
}
