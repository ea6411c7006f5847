/// Layer variants understood by the viewer. One layer type with a kind
/// discriminator; variant-specific fields live in the kind's schema.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Osm,
    Wms,
    Wmts,
    Hips,
    GeoJson,
    /// A group of layers usable anywhere a layer is.
    Group,
}

/// UI controls positioned on top of the map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// Embeds an arbitrary view-producing entity.
    Widget,
    Layers,
    Zoom,
}

/// Kind discriminator for every entity in a scene.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Layer(LayerKind),
    Control(ControlKind),
    Map,
}

impl EntityKind {
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Layer(LayerKind::Osm) => "osm_layer",
            EntityKind::Layer(LayerKind::Wms) => "wms_layer",
            EntityKind::Layer(LayerKind::Wmts) => "wmts_layer",
            EntityKind::Layer(LayerKind::Hips) => "hips_layer",
            EntityKind::Layer(LayerKind::GeoJson) => "geojson_layer",
            EntityKind::Layer(LayerKind::Group) => "layer_group",
            EntityKind::Control(ControlKind::Widget) => "widget_control",
            EntityKind::Control(ControlKind::Layers) => "layers_control",
            EntityKind::Control(ControlKind::Zoom) => "zoom_control",
            EntityKind::Map => "map",
        }
    }

    pub fn is_layer(self) -> bool {
        matches!(self, EntityKind::Layer(_))
    }

    pub fn is_control(self) -> bool {
        matches!(self, EntityKind::Control(_))
    }

    /// Tile-service layers accept imperative redraw commands.
    pub fn is_tile_service(self) -> bool {
        matches!(
            self,
            EntityKind::Layer(LayerKind::Osm)
                | EntityKind::Layer(LayerKind::Wms)
                | EntityKind::Layer(LayerKind::Wmts)
                | EntityKind::Layer(LayerKind::Hips)
        )
    }

    /// Kinds that own an ordered `layers` collection.
    pub fn has_layers(self) -> bool {
        matches!(self, EntityKind::Map | EntityKind::Layer(LayerKind::Group))
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
