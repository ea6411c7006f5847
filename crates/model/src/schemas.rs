//! Per-kind attribute schemas, built once at first use.

use foundation::crs::Crs;
use once_cell::sync::Lazy;
use schema::{AttrDomain, AttrSpec, AttrValue, EntitySchema, SchemaBuilder};
use serde_json::json;

use crate::kind::{ControlKind, EntityKind, LayerKind};

const POSITIONS: &[&str] = &["topleft", "topright", "bottomleft", "bottomright"];

const UNIT_INTERVAL: AttrDomain = AttrDomain::Float {
    min: Some(0.0),
    max: Some(1.0),
};

fn zoom_domain() -> AttrDomain {
    AttrDomain::Int {
        min: Some(0),
        max: Some(24),
    }
}

fn empty_map() -> AttrValue {
    AttrValue::Json(json!({}))
}

/// Derived read-only list of option names; recomputed from the schema when
/// defaults are materialized.
fn options_attr() -> AttrSpec {
    AttrSpec::new("options", AttrDomain::StrList, AttrValue::StrList(Vec::new())).read_only()
}

fn layer_base(builder: SchemaBuilder) -> SchemaBuilder {
    builder
        .attr(AttrSpec::new("name", AttrDomain::Str, AttrValue::from("")))
        .attr(AttrSpec::new("visible", AttrDomain::Bool, AttrValue::Bool(true)))
        .attr(AttrSpec::new("opacity", UNIT_INTERVAL, AttrValue::Float(1.0)))
        .attr(AttrSpec::new(
            "background",
            AttrDomain::Bool,
            AttrValue::Bool(false),
        ))
        .attr(options_attr())
}

fn tile_service(builder: SchemaBuilder, default_url: &str) -> SchemaBuilder {
    builder
        .attr(AttrSpec::new(
            "url",
            AttrDomain::Str,
            AttrValue::from(default_url),
        ))
        .attr(AttrSpec::new("min_zoom", zoom_domain(), AttrValue::Int(0)).option())
        .attr(AttrSpec::new("max_zoom", zoom_domain(), AttrValue::Int(18)).option())
        .attr(AttrSpec::new("attribution", AttrDomain::Str, AttrValue::from("")).option())
}

static OSM: Lazy<EntitySchema> = Lazy::new(|| {
    tile_service(
        layer_base(EntitySchema::builder("osm_layer")),
        "https://c.tile.openstreetmap.org",
    )
    .build()
});

static WMS: Lazy<EntitySchema> = Lazy::new(|| {
    tile_service(layer_base(EntitySchema::builder("wms_layer")), "")
        .attr(AttrSpec::new("layers", AttrDomain::Str, AttrValue::from("")).option())
        .attr(AttrSpec::new("format", AttrDomain::Str, AttrValue::from("image/jpeg")).option())
        .attr(AttrSpec::new("transparent", AttrDomain::Bool, AttrValue::Bool(false)).option())
        .build()
});

static WMTS: Lazy<EntitySchema> = Lazy::new(|| {
    tile_service(layer_base(EntitySchema::builder("wmts_layer")), "")
        .attr(AttrSpec::new("layers", AttrDomain::Str, AttrValue::from("")).option())
        .attr(AttrSpec::new("format", AttrDomain::Str, AttrValue::from("image/jpeg")).option())
        .attr(AttrSpec::new("transparent", AttrDomain::Bool, AttrValue::Bool(false)).option())
        .attr(AttrSpec::new("time", AttrDomain::Str, AttrValue::from("")).option())
        .build()
});

static HIPS: Lazy<EntitySchema> = Lazy::new(|| {
    layer_base(EntitySchema::builder("hips_layer"))
        .attr(AttrSpec::new("url", AttrDomain::Str, AttrValue::from("")))
        .build()
});

static GEOJSON: Lazy<EntitySchema> = Lazy::new(|| {
    layer_base(EntitySchema::builder("geojson_layer"))
        .attr(AttrSpec::new("data", AttrDomain::Json, empty_map()))
        .attr(AttrSpec::new("style", AttrDomain::Json, empty_map()))
        .attr(AttrSpec::new("hover_style", AttrDomain::Json, empty_map()))
        .attr(AttrSpec::new("point_style", AttrDomain::Json, empty_map()))
        .build()
});

static GROUP: Lazy<EntitySchema> = Lazy::new(|| {
    layer_base(EntitySchema::builder("layer_group"))
        .attr(AttrSpec::new(
            "layers",
            AttrDomain::Entities,
            AttrValue::Entities(Vec::new()),
        ))
        .build()
});

fn control_base(builder: SchemaBuilder) -> SchemaBuilder {
    builder
        .attr(
            AttrSpec::new(
                "position",
                AttrDomain::OneOf(POSITIONS),
                AttrValue::from("topleft"),
            )
            .option(),
        )
        .attr(options_attr())
}

static WIDGET_CONTROL: Lazy<EntitySchema> = Lazy::new(|| {
    let dimension = || AttrDomain::Int {
        min: Some(0),
        max: None,
    };
    control_base(EntitySchema::builder("widget_control"))
        .attr(AttrSpec::new("widget", AttrDomain::Entity, AttrValue::Null).nullable())
        .attr(AttrSpec::new("max_width", dimension(), AttrValue::Null).nullable())
        .attr(AttrSpec::new("min_width", dimension(), AttrValue::Null).nullable())
        .attr(AttrSpec::new("max_height", dimension(), AttrValue::Null).nullable())
        .attr(AttrSpec::new("min_height", dimension(), AttrValue::Null).nullable())
        .attr(AttrSpec::new("transparent_bg", AttrDomain::Bool, AttrValue::Bool(false)).option())
        .build()
});

static LAYERS_CONTROL: Lazy<EntitySchema> =
    Lazy::new(|| control_base(EntitySchema::builder("layers_control")).build());

static ZOOM_CONTROL: Lazy<EntitySchema> = Lazy::new(|| {
    control_base(EntitySchema::builder("zoom_control"))
        .attr(AttrSpec::new("zoom_in_text", AttrDomain::Str, AttrValue::from("+")).option())
        .attr(AttrSpec::new("zoom_in_title", AttrDomain::Str, AttrValue::from("Zoom in")).option())
        .attr(AttrSpec::new("zoom_out_text", AttrDomain::Str, AttrValue::from("-")).option())
        .attr(
            AttrSpec::new("zoom_out_title", AttrDomain::Str, AttrValue::from("Zoom out")).option(),
        )
        .build()
});

static MAP: Lazy<EntitySchema> = Lazy::new(|| {
    EntitySchema::builder("map")
        .attr(AttrSpec::new(
            "crs",
            AttrDomain::OneOf(&Crs::IDENTS),
            AttrValue::Str(Crs::Wgs84.ident().to_string()),
        ))
        .attr(AttrSpec::new("context", AttrDomain::Str, AttrValue::from("")).read_only())
        .attr(AttrSpec::new(
            "center",
            AttrDomain::LngLatPair,
            AttrValue::Json(json!([0.0, 0.0])),
        ))
        .attr(AttrSpec::new(
            "zoom_opts",
            AttrDomain::MapNumericKeys(&["distance", "fov"]),
            empty_map(),
        ))
        .attr(AttrSpec::new(
            "layers",
            AttrDomain::Entities,
            AttrValue::Entities(Vec::new()),
        ))
        .attr(AttrSpec::new(
            "controls",
            AttrDomain::Entities,
            AttrValue::Entities(Vec::new()),
        ))
        .attr(AttrSpec::new(
            "width",
            AttrDomain::Int {
                min: Some(1),
                max: None,
            },
            AttrValue::Int(800),
        ))
        .attr(AttrSpec::new(
            "height",
            AttrDomain::Int {
                min: Some(1),
                max: None,
            },
            AttrValue::Int(600),
        ))
        .attr(AttrSpec::new("dragging", AttrDomain::Bool, AttrValue::Bool(true)).option())
        .attr(AttrSpec::new("scroll_wheel_zoom", AttrDomain::Bool, AttrValue::Bool(false)).option())
        .attr(AttrSpec::new("double_click_zoom", AttrDomain::Bool, AttrValue::Bool(true)).option())
        .attr(options_attr())
        .build()
});

pub fn schema_for(kind: EntityKind) -> &'static EntitySchema {
    match kind {
        EntityKind::Layer(LayerKind::Osm) => &OSM,
        EntityKind::Layer(LayerKind::Wms) => &WMS,
        EntityKind::Layer(LayerKind::Wmts) => &WMTS,
        EntityKind::Layer(LayerKind::Hips) => &HIPS,
        EntityKind::Layer(LayerKind::GeoJson) => &GEOJSON,
        EntityKind::Layer(LayerKind::Group) => &GROUP,
        EntityKind::Control(ControlKind::Widget) => &WIDGET_CONTROL,
        EntityKind::Control(ControlKind::Layers) => &LAYERS_CONTROL,
        EntityKind::Control(ControlKind::Zoom) => &ZOOM_CONTROL,
        EntityKind::Map => &MAP,
    }
}
