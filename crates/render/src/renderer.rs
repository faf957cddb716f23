use glam::Vec3;
use waywalk_kernel::World;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 10.0, 15.0),
            target: Vec3::ZERO,
            fov_degrees: 60.0,
        }
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads world state and a view configuration, then produces
/// output. It never mutates the world.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given world state and view.
    fn render(&self, world: &World, view: &RenderView) -> Self::Output;
}

/// Text renderer for the CLI, logs and tests.
///
/// One line per entity; agents also show their current leg and the distance
/// walked since the last reset.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, world: &World, view: &RenderView) -> String {
        let mut out = String::new();
        out.push_str(&format!("=== Scene (tick={}) ===\n", world.tick()));
        out.push_str(&format!(
            "Entities: {} (agents: {})\n",
            world.entity_count(),
            world.agent_count()
        ));
        out.push_str(&format!(
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}\n",
            view.eye.x, view.eye.y, view.eye.z, view.target.x, view.target.y, view.target.z,
            view.fov_degrees
        ));

        for (id, data) in world.entities() {
            let p = data.transform.position;
            let f = data.transform.forward();
            out.push_str(&format!(
                "  [{}] pos=({:.2}, {:.2}, {:.2}) facing=({:.2}, {:.2}, {:.2})",
                id.short(),
                p.x,
                p.y,
                p.z,
                f.x,
                f.y,
                f.z
            ));
            if let Some(agent) = world.agent(*id) {
                let state = agent.walker().state();
                out.push_str(&format!(
                    " leg={}/{} walked={:.3}",
                    state.current_leg_index + 1,
                    agent.walker().leg_count(),
                    state.distance_traveled_since_last_turn
                ));
            }
            out.push('\n');
        }

        tracing::trace!(bytes = out.len(), "debug frame rendered");
        out
    }
}
