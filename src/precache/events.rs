//! Translation of host engine precache events into resource paths.

use serde::{Deserialize, Serialize};

use crate::http::path::normalize_request_path;

/// Sky box faces the engine loads for `sv_skyname`.
const SKY_FACES: [&str; 6] = ["bk", "dn", "ft", "lf", "rt", "up"];
const SKY_FORMATS: [&str; 2] = ["tga", "bmp"];

/// Which engine precache hook produced a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecacheKind {
    Model,
    Sound,
    Generic,
}

impl PrecacheKind {
    /// Game-directory relative path of the precached resource.
    ///
    /// Sound hooks receive paths relative to `sound/`.
    pub fn resource_path(self, path: &str) -> String {
        let path = path.replace('\\', "/");
        match self {
            PrecacheKind::Sound => clean_relative(&format!("sound/{}", path)),
            PrecacheKind::Model | PrecacheKind::Generic => clean_relative(&path),
        }
    }
}

/// Lexically clean a game-relative path so it matches request keys.
fn clean_relative(path: &str) -> String {
    normalize_request_path(path)
        .trim_start_matches('/')
        .to_string()
}

/// Resources tied to the active map that clients download without an
/// explicit precache call: the BSP itself, overview images, map text files
/// and the sky box.
pub fn map_resources(map_path: &str, sky_name: &str) -> Vec<String> {
    let map_path = clean_relative(&map_path.replace('\\', "/"));
    let file_name = map_path.rsplit('/').next().unwrap_or(&map_path);
    let map_name = match file_name.rfind('.') {
        Some(idx) => &file_name[..idx],
        None => file_name,
    };

    let mut resources = vec![
        map_path.clone(),
        format!("overviews/{map_name}.txt"),
        format!("overviews/{map_name}.bmp"),
        format!("overviews/{map_name}.tga"),
        format!("maps/{map_name}.txt"),
        format!("maps/{map_name}_detail.txt"),
    ];

    if !sky_name.is_empty() {
        for format in SKY_FORMATS {
            for face in SKY_FACES {
                resources.push(format!("gfx/env/{sky_name}{face}.{format}"));
            }
        }
    }

    resources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_paths_are_prefixed() {
        assert_eq!(
            PrecacheKind::Sound.resource_path("weapons/ak47-1.wav"),
            "sound/weapons/ak47-1.wav"
        );
        assert_eq!(
            PrecacheKind::Model.resource_path("models\\v_ak47.mdl"),
            "models/v_ak47.mdl"
        );
        assert_eq!(
            PrecacheKind::Generic.resource_path("gfx/vgui/ct.tga"),
            "gfx/vgui/ct.tga"
        );
    }

    #[test]
    fn test_resource_paths_are_cleaned() {
        assert_eq!(
            PrecacheKind::Sound.resource_path("./ambience//wind.wav"),
            "sound/ambience/wind.wav"
        );
        assert_eq!(
            PrecacheKind::Sound.resource_path("/weapons/../ambience/wind.wav"),
            "sound/ambience/wind.wav"
        );
        assert_eq!(
            PrecacheKind::Model.resource_path("/models/./player.mdl"),
            "models/player.mdl"
        );
        assert_eq!(map_resources("./maps//de_dust2.bsp", "")[0], "maps/de_dust2.bsp");
    }

    #[test]
    fn test_map_resources_with_sky() {
        let resources = map_resources("maps/de_dust2.bsp", "desert");

        assert_eq!(resources.len(), 18);
        assert_eq!(resources[0], "maps/de_dust2.bsp");
        assert!(resources.contains(&"overviews/de_dust2.bmp".to_string()));
        assert!(resources.contains(&"maps/de_dust2_detail.txt".to_string()));
        assert!(resources.contains(&"gfx/env/desertup.tga".to_string()));
        assert!(resources.contains(&"gfx/env/desertbk.bmp".to_string()));
    }

    #[test]
    fn test_map_resources_without_sky() {
        let resources = map_resources("maps/cs_office.bsp", "");
        assert_eq!(resources.len(), 6);
        assert!(resources.iter().all(|r| !r.starts_with("gfx/env")));
    }
}
