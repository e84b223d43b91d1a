use crate::config::RenderConfig;
use crate::geometry::Vector2;
use crate::ir::Graph;
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

pub fn render_svg(graph: &Graph, theme: &Theme, config: &RenderConfig) -> String {
    let mut svg = String::new();
    let width = config.width.max(1.0);
    let height = config.height.max(1.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\">",
    ));

    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        config.background
    ));

    svg.push_str(&format!(
        "<g fill=\"none\" stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"{}\" \
         stroke-linecap=\"round\">",
        theme.edge_color, theme.edge_opacity, theme.edge_width
    ));
    for edge in &graph.edges {
        let d = if config.smooth {
            points_to_smooth_path(&edge.subdivision_points)
        } else {
            points_to_path(&edge.subdivision_points)
        };
        if d.is_empty() {
            continue;
        }
        svg.push_str(&format!("<path d=\"{d}\"/>"));
    }
    svg.push_str("</g>");

    if config.show_nodes {
        svg.push_str(&format!("<g fill=\"{}\">", theme.node_color));
        for node in &graph.nodes {
            svg.push_str(&format!(
                "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{}\"/>",
                node.position.x, node.position.y, theme.node_radius
            ));
        }
        svg.push_str("</g>");
    }

    if config.show_labels {
        svg.push_str(&format!(
            "<g font-family=\"{}\" font-size=\"{}\" fill=\"{}\">",
            theme.font_family, theme.font_size, theme.label_color
        ));
        let dx = theme.node_radius + 2.0;
        for node in &graph.nodes {
            svg.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\">{}</text>",
                node.position.x + dx as f64,
                node.position.y,
                escape_xml(&node.name)
            ));
        }
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}

fn points_to_path(points: &[Vector2]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].x, points[0].y));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.x, point.y));
    }
    d
}

/// Cubic segments through every point, tangents taken from the neighbours on
/// either side (Catmull-Rom). The ends reuse their only neighbour.
fn points_to_smooth_path(points: &[Vector2]) -> String {
    if points.len() < 3 {
        return points_to_path(points);
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].x, points[0].y));
    let last = points.len() - 1;
    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];
        let c1 = p1 + (p2 - p0) * (1.0 / 6.0);
        let c2 = p2 - (p3 - p1) * (1.0 / 6.0);
        d.push_str(&format!(
            " C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2}",
            c1.x, c1.y, c2.x, c2.y, p2.x, p2.y
        ));
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("invalid canvas size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::bundle;
    use crate::config::BundlingConfig;

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        let a = graph.add_node("A&B", Vector2::new(10.0, 10.0));
        let b = graph.add_node("C", Vector2::new(200.0, 10.0));
        let c = graph.add_node("D", Vector2::new(10.0, 40.0));
        let d = graph.add_node("E", Vector2::new(200.0, 40.0));
        graph.add_edge(a, b).unwrap();
        graph.add_edge(c, d).unwrap();
        graph
    }

    #[test]
    fn render_svg_basic() {
        let mut graph = sample_graph();
        let config = BundlingConfig {
            iterations_count: 10,
            cycles_count: 2,
            ..Default::default()
        };
        bundle(&mut graph, &config).unwrap();
        let render = RenderConfig {
            show_labels: true,
            ..Default::default()
        };
        let svg = render_svg(&graph, &Theme::classic(), &render);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<path ").count(), 2);
        assert_eq!(svg.matches("<circle ").count(), 4);
        assert!(svg.contains("A&amp;B"));
    }

    #[test]
    fn smooth_path_passes_through_every_point() {
        let pts = [
            Vector2::new(0.0, 0.0),
            Vector2::new(10.0, 5.0),
            Vector2::new(20.0, 0.0),
        ];
        let d = points_to_smooth_path(&pts);
        assert!(d.starts_with("M 0.00 0.00"));
        assert_eq!(d.matches(" C ").count(), 2);
        assert!(d.contains("10.00 5.00 C"));
        assert!(d.ends_with("20.00 0.00"));
    }

    #[test]
    fn straight_edges_fall_back_to_lines() {
        let pts = [Vector2::new(0.0, 0.0), Vector2::new(3.0, 4.0)];
        assert_eq!(points_to_smooth_path(&pts), "M 0.00 0.00 L 3.00 4.00");
        assert_eq!(points_to_path(&[]), "");
    }
}
