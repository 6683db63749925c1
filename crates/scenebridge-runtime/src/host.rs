//! In-memory stand-in for the embedded 3D-content host's scripting surface.
//!
//! The real host (its document model, its scripting API, its renderer) is a
//! collaborator this crate talks to, not something it implements. [`Host`] is the
//! seam: commands dispatched through [`crate::router`] only ever touch the host
//! through this trait, so a future integration swaps [`InMemoryHost`] for a real
//! binding without touching the framing, dispatch, or interpreter layers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    Mesh,
    Camera,
    Light,
    Empty,
    Other(String),
}

impl ObjectKind {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "mesh" | "cube" => Self::Mesh,
            "camera" => Self::Camera,
            "light" => Self::Light,
            "empty" => Self::Empty,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mesh => write!(f, "mesh"),
            Self::Camera => write!(f, "camera"),
            Self::Light => write!(f, "light"),
            Self::Empty => write!(f, "empty"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshStats {
    pub vertices: u32,
    pub edges: u32,
    pub faces: u32,
    pub polygons: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
    pub location: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
    pub visible: bool,
    pub materials: Vec<String>,
    pub mesh: Option<MeshStats>,
}

impl SceneObject {
    fn new(name: impl Into<String>, kind: ObjectKind, location: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            kind,
            location,
            rotation: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
            visible: true,
            materials: Vec::new(),
            mesh: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub objects: Vec<SceneObject>,
    pub materials: Vec<Material>,
}

/// Host errors are reported back through [`crate::error::Error::Host`].
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("object not found: {0}")]
    ObjectNotFound(String),
    #[error("object already exists: {0}")]
    ObjectExists(String),
}

/// Everything the command layer is allowed to do to the host's active document.
///
/// All methods take `&mut self` rather than `&self`: a `Host` is only ever
/// owned and called from the single host-worker task described in
/// [`crate::dispatcher`], so there is never concurrent access to serialize
/// against internally.
pub trait Host: Send {
    fn document(&self) -> &Document;

    fn add_cube(&mut self, name: Option<String>, location: [f64; 3]) -> Result<String, HostError>;

    fn add_object(
        &mut self,
        kind: ObjectKind,
        name: Option<String>,
        location: [f64; 3],
    ) -> Result<String, HostError>;

    fn set_visible(&mut self, name: &str, visible: bool) -> Result<(), HostError>;

    fn remove_object(&mut self, name: &str) -> Result<(), HostError>;

    /// Whether a window/viewport context is attached. Mirrors the
    /// `DriveMode` distinction in [`crate::loop_driver`]: interactive mode has
    /// a viewport to render, headless (background/CLI) mode does not.
    /// Viewport-dependent operations must consult this before touching the
    /// renderer.
    fn is_interactive(&self) -> bool;

    /// A deterministic placeholder screenshot: the real host renders the
    /// viewport, this stand-in returns a fixed PNG byte sequence so callers can
    /// exercise the base64 envelope without a renderer attached. Callers must
    /// check [`Host::is_interactive`] first; this method does not check it
    /// itself.
    fn render_viewport_png(&self) -> Vec<u8>;
}

/// Default in-process [`Host`] used by tests and by the bridge when no richer
/// binding is configured.
pub struct InMemoryHost {
    document: Document,
    next_id: u64,
    names: HashMap<String, ()>,
    interactive: bool,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self {
            document: Document {
                name: "Untitled".to_string(),
                objects: Vec::new(),
                materials: Vec::new(),
            },
            next_id: 0,
            names: HashMap::new(),
            interactive: true,
        }
    }

    /// Builds a host with no window context attached, as if started headless.
    pub fn new_headless() -> Self {
        Self {
            interactive: false,
            ..Self::new()
        }
    }

    fn allocate_name(&mut self, requested: Option<String>, prefix: &str) -> Result<String, HostError> {
        let name = requested.unwrap_or_else(|| {
            self.next_id += 1;
            format!("{prefix}.{:03}", self.next_id)
        });
        if self.names.contains_key(&name) {
            return Err(HostError::ObjectExists(name));
        }
        self.names.insert(name.clone(), ());
        Ok(name)
    }
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for InMemoryHost {
    fn document(&self) -> &Document {
        &self.document
    }

    fn add_cube(&mut self, name: Option<String>, location: [f64; 3]) -> Result<String, HostError> {
        self.add_object(ObjectKind::Mesh, name, location)
    }

    fn add_object(
        &mut self,
        kind: ObjectKind,
        name: Option<String>,
        location: [f64; 3],
    ) -> Result<String, HostError> {
        let prefix = match &kind {
            ObjectKind::Mesh => "Cube",
            ObjectKind::Camera => "Camera",
            ObjectKind::Light => "Light",
            ObjectKind::Empty => "Empty",
            ObjectKind::Other(_) => "Object",
        };
        let name = self.allocate_name(name, prefix)?;
        let mut object = SceneObject::new(name.clone(), kind.clone(), location);
        if matches!(kind, ObjectKind::Mesh) {
            object.mesh = Some(MeshStats {
                vertices: 8,
                edges: 12,
                faces: 6,
                polygons: 6,
            });
        }
        self.document.objects.push(object);
        Ok(name)
    }

    fn set_visible(&mut self, name: &str, visible: bool) -> Result<(), HostError> {
        let object = self
            .document
            .objects
            .iter_mut()
            .find(|o| o.name == name)
            .ok_or_else(|| HostError::ObjectNotFound(name.to_string()))?;
        object.visible = visible;
        Ok(())
    }

    fn remove_object(&mut self, name: &str) -> Result<(), HostError> {
        let before = self.document.objects.len();
        self.document.objects.retain(|o| o.name != name);
        if self.document.objects.len() == before {
            return Err(HostError::ObjectNotFound(name.to_string()));
        }
        self.names.remove(name);
        Ok(())
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn render_viewport_png(&self) -> Vec<u8> {
        // 1x1 transparent PNG, stable across calls so tests can assert on bytes.
        const PNG_1X1: &[u8] = &[
            0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48,
            0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
            0x00, 0x1f, 0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x78,
            0x9c, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00,
            0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
        ];
        PNG_1X1.to_vec()
    }
}
