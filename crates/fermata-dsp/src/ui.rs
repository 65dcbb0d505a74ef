use std::collections::BTreeMap;

use crate::ParamSlot;

/// Layout direction of a group node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Kind of a leaf control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Button,
    CheckBox,
    Slider,
    Knob,
    /// Read-only level indicator driven by the module.
    Bargraph,
}

impl ControlKind {
    pub fn is_writable(&self) -> bool {
        !matches!(self, ControlKind::Bargraph)
    }
}

/// One node of the UI-definition tree a module exposes.
///
/// The tree is rebuilt from scratch on every successful load and shares
/// parameter storage with the live module through [`ParamSlot`]s, so a control
/// moved on screen and a value the processing path writes are the same state.
#[derive(Debug, Clone)]
pub enum UiElement {
    Group(UiGroup),
    Control(UiControl),
}

#[derive(Debug, Clone)]
pub struct UiGroup {
    pub label: String,
    pub orientation: Orientation,
    pub children: Vec<UiElement>,
}

#[derive(Debug, Clone)]
pub struct UiControl {
    pub kind: ControlKind,
    pub label: String,
    slot: ParamSlot,
    pub init: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    metadata: BTreeMap<String, String>,
}

impl UiControl {
    /// Current underlying value, read straight from the module's storage.
    pub fn value(&self) -> f64 {
        self.slot.get()
    }

    /// Write the underlying value, clamped to `[min, max]`. Ignored for
    /// read-only controls.
    pub fn set_value(&self, value: f64) {
        if self.kind.is_writable() {
            self.slot.set(value.clamp(self.min, self.max));
        }
    }

    /// Current value rescaled to `[0, 1]`.
    pub fn normalized(&self) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            0.0
        } else {
            (self.value() - self.min) / span
        }
    }

    /// Write from a `[0, 1]` control position. Exact inverse of
    /// [`UiControl::normalized`] over the control's range.
    pub fn set_normalized(&self, normalized: f64) {
        self.set_value(self.min + normalized.clamp(0.0, 1.0) * (self.max - self.min));
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn metadata_iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.metadata.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Declaration protocol a module uses to describe its control surface.
///
/// Follows the Faust architecture convention: groups open and close around
/// their children, `declare` attaches a metadata key/value pair to the next
/// widget added.
pub trait UiBuilder {
    fn open_horizontal_group(&mut self, label: &str);
    fn open_vertical_group(&mut self, label: &str);
    fn close_group(&mut self);

    /// Attach metadata (unit, display style, ...) to the next widget.
    fn declare(&mut self, key: &str, value: &str);

    fn add_button(&mut self, label: &str, slot: &ParamSlot);
    fn add_check_box(&mut self, label: &str, slot: &ParamSlot);
    fn add_slider(&mut self, label: &str, slot: &ParamSlot, init: f64, min: f64, max: f64, step: f64);
    fn add_knob(&mut self, label: &str, slot: &ParamSlot, init: f64, min: f64, max: f64, step: f64);
    fn add_bargraph(&mut self, label: &str, slot: &ParamSlot, min: f64, max: f64);
}

/// [`UiBuilder`] that materializes the declarations into a [`UiElement`] tree.
pub struct UiTreeBuilder {
    stack: Vec<UiGroup>,
    pending: BTreeMap<String, String>,
}

impl UiTreeBuilder {
    pub fn new() -> Self {
        Self {
            stack: vec![UiGroup {
                label: String::new(),
                orientation: Orientation::Vertical,
                children: Vec::new(),
            }],
            pending: BTreeMap::new(),
        }
    }

    /// Consume the builder and return the root element. Groups left open are
    /// closed implicitly.
    pub fn finish(mut self) -> UiElement {
        while self.stack.len() > 1 {
            self.close_group();
        }
        let root = self.stack.pop().expect("root group");
        // A tree of exactly one group wrapping nothing but a single child
        // group collapses to that child.
        if root.label.is_empty() && root.children.len() == 1 {
            if let Some(UiElement::Group(_)) = root.children.first() {
                return root.children.into_iter().next().expect("single child");
            }
        }
        UiElement::Group(root)
    }

    fn open_group(&mut self, label: &str, orientation: Orientation) {
        self.stack.push(UiGroup {
            label: label.to_owned(),
            orientation,
            children: Vec::new(),
        });
    }

    fn push_control(
        &mut self,
        kind: ControlKind,
        label: &str,
        slot: &ParamSlot,
        init: f64,
        min: f64,
        max: f64,
        step: f64,
    ) {
        let metadata = std::mem::take(&mut self.pending);
        let control = UiControl {
            kind,
            label: label.to_owned(),
            slot: slot.clone(),
            init,
            min,
            max,
            step,
            metadata,
        };
        self.stack
            .last_mut()
            .expect("root group")
            .children
            .push(UiElement::Control(control));
    }
}

impl Default for UiTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl UiBuilder for UiTreeBuilder {
    fn open_horizontal_group(&mut self, label: &str) {
        self.open_group(label, Orientation::Horizontal);
    }

    fn open_vertical_group(&mut self, label: &str) {
        self.open_group(label, Orientation::Vertical);
    }

    fn close_group(&mut self) {
        if self.stack.len() > 1 {
            let group = self.stack.pop().expect("open group");
            self.stack
                .last_mut()
                .expect("root group")
                .children
                .push(UiElement::Group(group));
        }
    }

    fn declare(&mut self, key: &str, value: &str) {
        self.pending.insert(key.to_owned(), value.to_owned());
    }

    fn add_button(&mut self, label: &str, slot: &ParamSlot) {
        self.push_control(ControlKind::Button, label, slot, 0.0, 0.0, 1.0, 1.0);
    }

    fn add_check_box(&mut self, label: &str, slot: &ParamSlot) {
        self.push_control(ControlKind::CheckBox, label, slot, 0.0, 0.0, 1.0, 1.0);
    }

    fn add_slider(&mut self, label: &str, slot: &ParamSlot, init: f64, min: f64, max: f64, step: f64) {
        self.push_control(ControlKind::Slider, label, slot, init, min, max, step);
    }

    fn add_knob(&mut self, label: &str, slot: &ParamSlot, init: f64, min: f64, max: f64, step: f64) {
        self.push_control(ControlKind::Knob, label, slot, init, min, max, step);
    }

    fn add_bargraph(&mut self, label: &str, slot: &ParamSlot, min: f64, max: f64) {
        self.push_control(ControlKind::Bargraph, label, slot, min, min, max, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slider(min: f64, max: f64, value: f64) -> UiControl {
        let slot = ParamSlot::new(value);
        UiControl {
            kind: ControlKind::Slider,
            label: "level".into(),
            slot,
            init: value,
            min,
            max,
            step: 0.1,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn normalize_denormalize_are_inverse() {
        let control = slider(0.0, 10.0, 0.0);
        for x in [0.0, 2.5, 10.0] {
            control.set_value(x);
            let normalized = control.normalized();
            control.set_normalized(normalized);
            assert!((control.value() - x).abs() < 1e-12, "x = {x}");
        }
    }

    #[test]
    fn writes_clamp_to_range() {
        let control = slider(-1.0, 1.0, 0.0);
        control.set_value(4.0);
        assert_eq!(control.value(), 1.0);
        control.set_value(-4.0);
        assert_eq!(control.value(), -1.0);
    }

    #[test]
    fn bargraph_ignores_writes() {
        let slot = ParamSlot::new(0.3);
        let mut builder = UiTreeBuilder::new();
        builder.add_bargraph("level", &slot, 0.0, 1.0);
        let UiElement::Group(root) = builder.finish() else {
            panic!("root must be a group");
        };
        let UiElement::Control(bar) = &root.children[0] else {
            panic!("expected control");
        };
        bar.set_value(0.9);
        assert_eq!(bar.value(), 0.3);
        slot.set(0.7);
        assert_eq!(bar.value(), 0.7);
    }

    #[test]
    fn groups_nest_in_declaration_order() {
        let gain = ParamSlot::new(0.5);
        let mute = ParamSlot::new(0.0);
        let mut builder = UiTreeBuilder::new();
        builder.open_horizontal_group("tone");
        builder.declare("unit", "dB");
        builder.add_slider("gain", &gain, 0.5, 0.0, 1.0, 0.01);
        builder.open_vertical_group("switches");
        builder.add_check_box("mute", &mute);
        builder.close_group();
        builder.close_group();

        let UiElement::Group(tone) = builder.finish() else {
            panic!("root must be a group");
        };
        assert_eq!(tone.label, "tone");
        assert_eq!(tone.orientation, Orientation::Horizontal);
        assert_eq!(tone.children.len(), 2);

        let UiElement::Control(gain_ctl) = &tone.children[0] else {
            panic!("expected slider first");
        };
        assert_eq!(gain_ctl.metadata("unit"), Some("dB"));

        let UiElement::Group(switches) = &tone.children[1] else {
            panic!("expected nested group");
        };
        assert_eq!(switches.orientation, Orientation::Vertical);
        let UiElement::Control(mute_ctl) = &switches.children[0] else {
            panic!("expected checkbox");
        };
        // Metadata was consumed by the slider, not the later checkbox.
        assert_eq!(mute_ctl.metadata("unit"), None);
    }
}
