//! `globus`: drives a demo scene and prints the outbound patch stream.
//!
//! Builds a planet map with an OSM basemap, a GeoJSON overlay and a zoom
//! control, exercises a few mutations plus an inbound click, then prints
//! everything the view would have received as JSON lines.

use std::env;
use std::fs::File;
use std::io::Write;

use foundation::geo::LngLat;
use model::{Config, ControlKind, EntityKind, LayerKind, Scene};
use serde_json::json;
use sync::EventKind;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut export: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--export" => {
                i += 1;
                if i >= args.len() {
                    return Err("--export requires a file path".to_string());
                }
                export = Some(args[i].clone());
            }
            s => return Err(format!("unknown arg: {s}\n\n{}", usage())),
        }
        i += 1;
    }

    let mut scene = Scene::recording();

    let map = scene
        .create(
            EntityKind::Map,
            Config::new()
                .set("crs", "CRS:84")
                .set("center", LngLat::new(1.4529, 43.5973))
                .set("zoom_opts", json!({"distance": 50_000.0})),
        )
        .map_err(|e| e.to_string())?;

    let basemap = scene
        .add_layer(map, catalog::open_street_map_mapnik())
        .map_err(|e| e.to_string())?;

    let overlay = scene
        .create(
            EntityKind::Layer(LayerKind::GeoJson),
            Config::new().set("name", "overlay").set(
                "data",
                json!({
                    "type": "FeatureCollection",
                    "features": [{
                        "type": "Feature",
                        "geometry": {"type": "Point", "coordinates": [1.4529, 43.5973]},
                        "properties": {"name": "Toulouse"},
                    }],
                }),
            ),
        )
        .map_err(|e| e.to_string())?;
    scene.add_layer(map, overlay).map_err(|e| e.to_string())?;

    let zoom = scene
        .create(EntityKind::Control(ControlKind::Zoom), Config::new())
        .map_err(|e| e.to_string())?;
    scene.add_control(map, zoom).map_err(|e| e.to_string())?;

    scene
        .on(overlay, EventKind::Click, |payload| {
            info!(%payload, "feature clicked");
        })
        .map_err(|e| e.to_string())?;

    // A few host-side mutations the view would observe.
    scene
        .set(basemap, "opacity", 0.8)
        .map_err(|e| e.to_string())?;
    scene
        .set(map, "zoom_opts", json!({"distance": 12_000.0}))
        .map_err(|e| e.to_string())?;

    // And one inbound event, as the view would deliver it.
    let fired = scene.deliver(
        overlay,
        &json!({"type": "click", "feature": {"properties": {"name": "Toulouse"}}}),
    );
    info!(fired, "inbound click dispatched");

    for out in scene.sink().sent() {
        let line = serde_json::to_string(out).map_err(|e| e.to_string())?;
        println!("{line}");
    }

    if let Some(path) = export {
        let mut file = File::create(&path).map_err(|e| format!("create {path}: {e}"))?;
        scene
            .save_html(map, &mut file)
            .map_err(|e| e.to_string())?;
        file.flush().map_err(|e| e.to_string())?;
        info!(path = %path, "wrote static scene");
    }

    Ok(())
}

fn usage() -> String {
    "usage: globus [--export <file.html>]".to_string()
}
