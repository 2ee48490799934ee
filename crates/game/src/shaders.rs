use arcane_gfx::ShaderSource;

/// WGSL program for textured or vertex-coloured quads.
pub const SCENE_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) mvp_0: vec4<f32>,
    @location(4) mvp_1: vec4<f32>,
    @location(5) mvp_2: vec4<f32>,
    @location(6) mvp_3: vec4<f32>,
    @location(7) params: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) textured: f32,
};

@group(0) @binding(0)
var t_diffuse: texture_2d<f32>;
@group(0) @binding(1)
var s_diffuse: sampler;

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let mvp = mat4x4<f32>(
        instance.mvp_0,
        instance.mvp_1,
        instance.mvp_2,
        instance.mvp_3,
    );

    var out: VertexOutput;
    out.clip_position = mvp * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color;
    out.uv = vertex.uv;
    out.textured = instance.params.x;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let sampled = textureSample(t_diffuse, s_diffuse, in.uv);
    let base = vec4<f32>(in.color, 1.0);
    return select(base, sampled * base, in.textured > 0.5);
}
"#;

pub fn scene_source() -> ShaderSource {
    ShaderSource::new("scene", SCENE_SHADER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcane_gfx::{FRAGMENT_ENTRY, VERTEX_ENTRY};

    #[test]
    fn scene_declares_both_entry_points() {
        let source = scene_source();
        assert!(source.code.contains(&format!("fn {VERTEX_ENTRY}(")));
        assert!(source.code.contains(&format!("fn {FRAGMENT_ENTRY}(")));
        assert_eq!(source.name, "scene");
    }
}
