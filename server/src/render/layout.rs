use super::CredentialInput;
use crate::models::{Design, Dimensions, HexColor};

pub const HEADER_HEIGHT: f32 = 60.0;
pub const BORDER_WIDTH: f32 = 2.0;
/// How much darker the right end of the header gradient is.
pub const HEADER_SHADE: f32 = 0.2;

pub const BORDER_COLOR: HexColor = HexColor::rgb(0xe5, 0xe7, 0xeb);
pub const HEADER_TEXT_COLOR: HexColor = HexColor::rgb(0xff, 0xff, 0xff);
pub const DETAIL_TEXT_COLOR: HexColor = HexColor::rgb(0x6b, 0x72, 0x80);
pub const PHOTO_PLACEHOLDER_FILL: HexColor = HexColor::rgb(0xf3, 0xf4, 0xf6);
pub const PHOTO_PLACEHOLDER_TEXT: HexColor = HexColor::rgb(0x9c, 0xa3, 0xaf);

pub const EVENT_NAME_FALLBACK: &str = "Event Name";
pub const ATTENDEE_NAME_FALLBACK: &str = "Attendee Name";
pub const PHOTO_PLACEHOLDER_LABEL: &str = "Photo";

pub const PHOTO_AREA: Area = Area {
    x: 40.0,
    y: 100.0,
    width: 80.0,
    height: 80.0,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Area {
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Fill {
        area: Area,
        color: HexColor,
    },
    Stroke {
        area: Area,
        width: f32,
        color: HexColor,
    },
    /// Left-to-right linear gradient.
    Gradient {
        area: Area,
        from: HexColor,
        to: HexColor,
    },
    /// Text centered on `center_x`, sitting on `baseline`.
    Text {
        text: String,
        center_x: f32,
        baseline: f32,
        size: f32,
        weight: FontWeight,
        color: HexColor,
    },
    /// Photo scaled into `area` and clipped to its inscribed circle.
    Photo {
        area: Area,
    },
}

/// Ordered drawing steps of one credential.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialLayout {
    pub dimensions: Dimensions,
    pub ops: Vec<DrawOp>,
}

impl CredentialLayout {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

fn text(
    value: &str,
    center_x: f32,
    baseline: f32,
    size: f32,
    weight: FontWeight,
    color: HexColor,
) -> DrawOp {
    DrawOp::Text {
        text: value.to_string(),
        center_x,
        baseline,
        size,
        weight,
        color,
    }
}

/// Lays out the fixed credential pipeline. `has_photo` tells whether a
/// decoded photo is available; without one the placeholder box is laid out.
pub fn compose(input: &CredentialInput<'_>, has_photo: bool) -> CredentialLayout {
    let dimensions = input
        .template
        .map(|template| template.dimensions)
        .unwrap_or(input.fallback_dimensions);
    let design = input
        .template
        .map(|template| template.design)
        .unwrap_or_default();
    let Design {
        background_color,
        header_color,
        text_color,
        ..
    } = design;

    let width = dimensions.width as f32;
    let height = dimensions.height as f32;
    let center = width / 2.0;
    let canvas = Area {
        x: 0.0,
        y: 0.0,
        width,
        height,
    };

    let mut ops = vec![
        DrawOp::Fill {
            area: canvas,
            color: background_color,
        },
        DrawOp::Stroke {
            area: canvas,
            width: BORDER_WIDTH,
            color: BORDER_COLOR,
        },
        DrawOp::Gradient {
            area: Area {
                height: HEADER_HEIGHT,
                ..canvas
            },
            from: header_color,
            to: header_color.darken(HEADER_SHADE),
        },
    ];

    let event_name = input
        .event
        .map(|event| event.name.as_str())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(EVENT_NAME_FALLBACK);
    ops.push(text(
        event_name,
        center,
        35.0,
        16.0,
        FontWeight::Bold,
        HEADER_TEXT_COLOR,
    ));

    let attendee = input.attendee;
    ops.push(text(
        attendee.field("name").unwrap_or(ATTENDEE_NAME_FALLBACK),
        center,
        120.0,
        24.0,
        FontWeight::Bold,
        text_color,
    ));
    for (field, baseline) in [("email", 150.0), ("company", 175.0)] {
        if let Some(value) = attendee.field(field) {
            ops.push(text(
                value,
                center,
                baseline,
                14.0,
                FontWeight::Regular,
                DETAIL_TEXT_COLOR,
            ));
        }
    }

    if has_photo {
        ops.push(DrawOp::Photo { area: PHOTO_AREA });
    } else {
        ops.push(DrawOp::Fill {
            area: PHOTO_AREA,
            color: PHOTO_PLACEHOLDER_FILL,
        });
        ops.push(text(
            PHOTO_PLACEHOLDER_LABEL,
            PHOTO_AREA.center_x(),
            145.0,
            12.0,
            FontWeight::Regular,
            PHOTO_PLACEHOLDER_TEXT,
        ));
    }

    CredentialLayout { dimensions, ops }
}
