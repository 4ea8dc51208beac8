//! Build a resistor description, place two instances and print what they
//! draw and where their terminals are.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example resistor --features tracing
//! ```

use std::sync::Arc;

use compdesc::builder::Element;
use compdesc::render::{DrawingContext, PathCommand, TextAlignment, TextRun};
use compdesc::{Component, DescriptionBuilder, FlipState, LayoutInformation, LayoutOptions, Orientation, PropertyValue};
use glam::{DVec2, dvec2};

/// Prints every primitive as one line of SVG.
struct SvgLines;

impl DrawingContext for SvgLines {
    fn draw_line(&mut self, start: DVec2, end: DVec2, thickness: f64) {
        println!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke-width="{}"/>"#,
            start.x, start.y, end.x, end.y, thickness
        );
    }

    fn draw_rectangle(&mut self, top_left: DVec2, size: DVec2, thickness: f64, fill: bool) {
        println!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" stroke-width="{}" fill="{}"/>"#,
            top_left.x,
            top_left.y,
            size.x,
            size.y,
            thickness,
            if fill { "black" } else { "none" }
        );
    }

    fn draw_ellipse(&mut self, centre: DVec2, radius_x: f64, radius_y: f64, thickness: f64, fill: bool) {
        println!(
            r#"<ellipse cx="{}" cy="{}" rx="{}" ry="{}" stroke-width="{}" fill="{}"/>"#,
            centre.x,
            centre.y,
            radius_x,
            radius_y,
            thickness,
            if fill { "black" } else { "none" }
        );
    }

    fn draw_path(&mut self, start: DVec2, commands: &[PathCommand], thickness: f64, fill: bool) {
        let data: Vec<String> = commands.iter().map(ToString::to_string).collect();
        println!(
            r#"<path transform="translate({},{})" d="{}" stroke-width="{}" fill="{}"/>"#,
            start.x,
            start.y,
            data.join(" "),
            thickness,
            if fill { "black" } else { "none" }
        );
    }

    fn draw_text(&mut self, anchor: DVec2, alignment: TextAlignment, runs: &[TextRun]) {
        let text: String = runs.iter().map(|r| r.text.as_str()).collect();
        println!(r#"<text x="{}" y="{}" data-align="{}">{}</text>"#, anchor.x, anchor.y, alignment, text);
    }
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut builder = DescriptionBuilder::new("resistor", "Resistor");
    builder.property(
        &Element::new("property")
            .attr("name", "resistance")
            .attr("type", "decimal")
            .attr("default", "4700")
            .child(
                Element::new("format")
                    .attr("conditions", "$resistance>=1000")
                    .attr("value", "$resistance(div_1000)k\\u2126"),
            )
            .child(Element::new("format").attr("value", "$resistance\\u2126")),
    );
    builder.connections(
        &Element::new("connections").child(
            Element::new("connection")
                .attr("start", "Start,Start")
                .attr("end", "End,Start")
                .attr("edge", "both"),
        ),
    );
    builder.render(
        &Element::new("render").child(
            Element::new("group")
                .attr("autorotate", "true")
                .child(Element::new("line").attr("start", "Start,Start").attr("end", "Middle-20,Start"))
                .child(Element::new("line").attr("start", "Middle+20,Start").attr("end", "End,Start"))
                .child(
                    Element::new("rect")
                        .attr("location", "Middle-20,Start-8")
                        .attr("width", "40")
                        .attr("height", "16"),
                )
                .child(
                    Element::new("text")
                        .attr("location", "Middle,Start-12")
                        .attr("align", "BottomCentre")
                        .attr("value", "$resistance"),
                ),
        ),
    );

    let (description, diagnostics) = builder.build();
    for diagnostic in diagnostics.into_vec() {
        eprintln!("{:?}", miette::Report::new(diagnostic));
    }
    let description = Arc::new(description);

    let mut horizontal = Component::new(Arc::clone(&description))
        .with_layout(LayoutInformation::new(dvec2(100.0, 100.0), 80.0, Orientation::Horizontal));
    horizontal.set_property("resistance", PropertyValue::Numeric(220.0));

    let vertical = Component::new(description).with_layout(
        LayoutInformation::new(dvec2(300.0, 60.0), 80.0, Orientation::Vertical).with_flip(FlipState::PRIMARY),
    );

    for component in [&horizontal, &vertical] {
        println!("<!-- {} ({}) -->", component.description().name(), component.layout.orientation);
        component.render(LayoutOptions::absolute(), &mut SvgLines);
        for point in component.connections(LayoutOptions::default()) {
            println!("<!-- terminal {} at {},{} [{}] -->", point.name, point.location.x, point.location.y, point.flags);
        }
    }
    Ok(())
}
