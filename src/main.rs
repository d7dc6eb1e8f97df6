use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use stress_test::{stress_test_registration, stress_test_scaling};
use tracing_subscriber::EnvFilter;
use unveil_engine::{
    Element, MemoryDocument, MemoryNode, Reveal, StyleError, TokioScheduler,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("unveil=info")),
        )
        .init();

    // Deferred initialization runs on the thread that issues reveal calls.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(async_main())
}

/// A landing page: a header, a row of cards and a photo gallery.
fn landing_page() -> (MemoryDocument, MemoryNode) {
    let doc = MemoryDocument::new();
    let body = doc.root().append(MemoryNode::new("body"));
    body.append(MemoryNode::new("header").with_id("top"));
    let cards = body.append(MemoryNode::new("section").with_id("features"));
    for _ in 0..3 {
        cards.append(MemoryNode::new("article").with_class("card"));
    }
    let gallery = body.append(MemoryNode::new("section").with_id("gallery"));
    for _ in 0..4 {
        gallery.append(MemoryNode::new("img").with_class("photo"));
    }
    (doc, gallery)
}

/// Initial-state styles derived from an element's merged config.
fn initial_styles(element: &Element<MemoryNode>) -> Result<Value, StyleError> {
    let config = &element.config;
    let distance = config["distance"].as_str().unwrap_or("0");
    let (axis, sign) = match config["origin"].as_str() {
        Some("top") => ("Y", "-"),
        Some("bottom") => ("Y", ""),
        Some("left") => ("X", "-"),
        Some("right") => ("X", ""),
        other => {
            return Err(StyleError::new(
                element.id,
                format!("unknown origin {:?}", other),
            ))
        }
    };
    let scale = config["scale"].as_f64().unwrap_or(1.0);

    Ok(json!({
        "opacity": config["opacity"],
        "transform": format!("translate{}({}{}) scale({})", axis, sign, distance, scale),
        "transition": format!(
            "opacity {duration}ms {easing}, transform {duration}ms {easing}",
            duration = config["duration"],
            easing = config["easing"].as_str().unwrap_or("ease"),
        ),
    }))
}

async fn async_main() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║            REVEAL REGISTRATION DEMO                         ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    let (doc, gallery) = landing_page();
    let engine = Reveal::builder(doc, Arc::new(TokioScheduler::current()?))
        .styles(initial_styles)
        .initializer(|engine: &Reveal<MemoryNode>| {
            let store = engine.store();
            println!(
                "  initialize: {} elements, {} sequences, {} containers",
                store.elements.len(),
                store.sequences.len(),
                store.containers.len()
            );
        })
        .build()?;

    println!("\n[1/4] Registering header, cards and gallery in one burst...");
    engine
        .reveal("header", json!({ "origin": "top", "distance": "40px" }), None)
        .reveal(".card", json!({ "scale": 0.85, "delay": 100 }), Some(150))
        .reveal(".photo", -80, None)
        // Not a known origin: style generation fails per photo and is logged.
        .reveal(".photo", json!({ "origin": "sideways" }), None);

    tokio::time::sleep(Duration::from_millis(10)).await;

    println!("\n[2/4] Lazy-loading two more photos and syncing...");
    for _ in 0..2 {
        gallery.append(MemoryNode::new("img").with_class("photo"));
    }
    engine.sync();

    println!("\n[3/4] Cleaning the header...");
    engine.clean("header");

    println!("\n[4/4] Final store:");
    println!("{}", serde_json::to_string_pretty(&engine.snapshot().to_json()?)?);

    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            ASYNC STRESS TESTS                               ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    let stats = stress_test_registration(4, 100, 50).await?;
    stats.print();

    let stats = stress_test_registration(16, 200, 100).await?;
    stats.print();

    stress_test_scaling(16, 4).await?;

    println!("\n✓ Demo and stress tests completed successfully!");
    Ok(())
}
