use bustrack_transit::position::StopState;

pub type Color = palette::Srgba<f32>;

fn hex(rgb: u32) -> Color {
    let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
    palette::Srgba::new(channel(16), channel(8), channel(0), 1.0)
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineStyle {
    pub color: Color,
    /// Screen-space width in pixels
    pub width: f32,
    pub dashed: bool,
}

impl LineStyle {
    pub fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dashed: false,
        }
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarkerStyle {
    pub fill: Color,
    pub border_color: Color,
    pub border_width: f32,
    /// Screen-space radius in pixels
    pub radius: f32,
    /// Drawn above other markers and with a stronger outline.
    pub emphasized: bool,
}

impl MarkerStyle {
    pub fn solid_color(fill: Color, radius: f32) -> Self {
        Self {
            fill,
            border_color: palette::Srgba::new(0.0, 0.0, 0.0, 0.0),
            border_width: 0.0,
            radius,
            emphasized: false,
        }
    }

    pub fn with_border(mut self, border_width: f32, border_color: Color) -> Self {
        self.border_color = border_color;
        self.border_width = border_width;
        self
    }

    pub fn emphasized(mut self) -> Self {
        self.emphasized = true;
        self
    }
}

/// Colours and sizes for everything the map engine draws.
#[derive(Clone, Debug, PartialEq)]
pub struct MapTheme {
    pub route_line: LineStyle,
    /// Used when the line is drawn through stops because no shape is known.
    pub stop_line: LineStyle,
    pub passed: Color,
    pub current: Color,
    pub between: Color,
    pub target: Color,
    pub upcoming: Color,
    pub unknown: Color,
    pub vehicle: Color,
    pub selected_vehicle: Color,
    pub outline: Color,
}

impl Default for MapTheme {
    fn default() -> Self {
        Self {
            route_line: LineStyle::solid(hex(0x2563eb), 4.0),
            stop_line: LineStyle::solid(hex(0x2563eb), 3.0).dashed(),
            passed: hex(0x9ca3af),
            current: hex(0x16a34a),
            between: hex(0xf59e0b),
            target: hex(0xdc2626),
            upcoming: hex(0x3b82f6),
            unknown: hex(0x6b7280),
            vehicle: hex(0x1d4ed8),
            selected_vehicle: hex(0xf97316),
            outline: hex(0xffffff),
        }
    }
}

impl MapTheme {
    pub fn line(&self, from_shape: bool) -> &LineStyle {
        if from_shape {
            &self.route_line
        } else {
            &self.stop_line
        }
    }

    pub fn stop(&self, state: StopState, is_target: bool) -> MarkerStyle {
        if is_target {
            return MarkerStyle::solid_color(self.target, 9.0)
                .with_border(3.0, self.outline)
                .emphasized();
        }

        let fill = match state {
            StopState::Passed => self.passed,
            StopState::Current => self.current,
            StopState::Between => self.between,
            StopState::Target => self.target,
            StopState::Upcoming => self.upcoming,
            StopState::Unknown => self.unknown,
        };
        let radius = if state == StopState::Current { 7.0 } else { 5.0 };

        MarkerStyle::solid_color(fill, radius).with_border(1.5, self.outline)
    }

    pub fn vehicle(&self, selected: bool) -> MarkerStyle {
        if selected {
            MarkerStyle::solid_color(self.selected_vehicle, 13.0)
                .with_border(3.0, self.outline)
                .emphasized()
        } else {
            MarkerStyle::solid_color(self.vehicle, 10.0).with_border(2.0, self.outline)
        }
    }
}
