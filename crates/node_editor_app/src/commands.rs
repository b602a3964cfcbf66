// SPDX-License-Identifier: MIT OR Apache-2.0
//! Subcommand implementations.

use anyhow::{bail, Context, Result};
use node_editor_graph::{
    ConnectOutcome, EditorSettings, NodeEditor, NodeField, NodeId, NodeType, Point,
    ValueType, ValueTypeRegistry,
};
use node_editor_store::{FileGraphStore, GraphId, GraphStore, OwnerId};
use std::fmt;
use std::path::Path;

/// Settings from `path`, or the defaults when none is given
pub fn load_settings(path: Option<&Path>) -> Result<EditorSettings> {
    match path {
        Some(path) => {
            let settings = EditorSettings::load(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?;
            tracing::debug!("Loaded settings from {:?}: {:?}", path, settings);
            Ok(settings)
        }
        None => Ok(EditorSettings::default()),
    }
}

fn load_editor(file: &Path, settings: EditorSettings) -> Result<NodeEditor> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    NodeEditor::from_json(&json, ValueTypeRegistry::shared(), settings)
        .with_context(|| format!("Invalid graph in {}", file.display()))
}

/// Whether any existing connection lies on a directed cycle
fn has_cycle(editor: &NodeEditor) -> bool {
    editor.nodes().any(|node| {
        node.connections()
            .iter()
            .any(|c| editor.connection_would_cycle(node.id(), &c.to))
    })
}

/// Write a human-readable listing of a graph
pub fn write_description(out: &mut impl fmt::Write, editor: &NodeEditor) -> fmt::Result {
    writeln!(out, "Node types ({}):", editor.node_types().len())?;
    for node_type in editor.node_types() {
        writeln!(out, "  {} [{}]", node_type.name, node_type.id)?;
        for field in &node_type.fields {
            let mut flags = Vec::new();
            if field.required {
                flags.push("required");
            }
            if !field.shown {
                flags.push("hidden");
            }
            write!(
                out,
                "    {}: {} = {}",
                field.name, field.value_type.name, field.default
            )?;
            if !flags.is_empty() {
                write!(out, " ({})", flags.join(", "))?;
            }
            writeln!(out)?;
        }
    }

    writeln!(out, "Nodes ({}):", editor.node_count())?;
    for node in editor.nodes() {
        let type_name = editor
            .node_type(node.node_type())
            .map_or("?", |t| t.name.as_str());
        let position = node.position();
        writeln!(
            out,
            "  {} \"{}\" : {} at ({}, {})",
            node.id(),
            node.name(),
            type_name,
            position.x,
            position.y
        )?;
        for connection in node.connections() {
            writeln!(out, "    -> {}", connection.to)?;
        }
    }

    let viewport = editor.viewport();
    writeln!(
        out,
        "Connections: {}, cycles: {}",
        editor.connection_count(),
        if has_cycle(editor) { "yes" } else { "no" }
    )?;
    writeln!(
        out,
        "Viewport: pan ({}, {}), zoom {}",
        viewport.position.x, viewport.position.y, viewport.zoom
    )
}

/// `inspect`
pub fn inspect(file: &Path, settings: EditorSettings) -> Result<()> {
    let editor = load_editor(file, settings)?;
    let mut text = String::new();
    write_description(&mut text, &editor)?;
    print!("{text}");
    Ok(())
}

/// Small pipeline graph built through the editor API
pub fn demo_editor(settings: EditorSettings) -> Result<NodeEditor> {
    let mut editor = NodeEditor::default().with_settings(settings)?;

    editor.add_node_type(
        NodeType::new("Source")
            .with_id("source")
            .with_field(
                NodeField::new("Path", ValueType::new("string"))
                    .with_id("path")
                    .required(),
            ),
    )?;
    editor.add_node_type(
        NodeType::new("Filter")
            .with_id("filter")
            .with_field(
                NodeField::new("Expression", ValueType::new("string"))
                    .with_id("expression")
                    .with_default("true"),
            )
            .with_field(
                NodeField::new("Enabled", ValueType::new("boolean"))
                    .with_id("enabled")
                    .with_default(true),
            ),
    )?;
    editor.add_node_type(
        NodeType::new("Sink").with_id("sink").with_field(
            NodeField::new("Color", ValueType::new("color"))
                .with_id("color")
                .with_default("#4080ff")
                .hidden(),
        ),
    )?;

    let source = editor.create_node("Source", Point::new(-300.0, 0.0))?;
    let filter = editor.create_node("Filter", Point::new(0.0, 0.0))?;
    let sink = editor.create_node("Sink", Point::new(300.0, 0.0))?;
    editor.set_node_value(&source, &"path".into(), "input.csv".into())?;

    for (from, to) in [(&source, &filter), (&filter, &sink)] {
        let outcome = connect(&mut editor, from, to);
        if outcome != ConnectOutcome::Connected {
            bail!("Demo connection {from} -> {to} failed: {outcome:?}");
        }
    }
    // Closing the loop is refused while cycle prevention is on
    let outcome = connect(&mut editor, &sink, &source);
    tracing::info!("Connecting {} -> {}: {:?}", sink, source, outcome);

    Ok(editor)
}

fn connect(editor: &mut NodeEditor, from: &NodeId, to: &NodeId) -> ConnectOutcome {
    editor.start_connection(from);
    editor.finish_connection(from, Some(to))
}

/// `demo`
pub fn demo(out: Option<&Path>, settings: EditorSettings) -> Result<()> {
    let editor = demo_editor(settings)?;
    let json = editor.to_json_pretty()?;
    match out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote demo graph to {:?}", path);
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// `save`
pub async fn save(
    store: &Path,
    owner: &str,
    graph: Option<&str>,
    file: &Path,
    settings: EditorSettings,
) -> Result<()> {
    let owner = OwnerId::parse(owner)?;
    let graph = match graph {
        Some(graph) => GraphId::parse(graph)?,
        None => GraphId::generate(),
    };
    // Only graphs that load cleanly are stored
    let snapshot = load_editor(file, settings)?.to_snapshot();

    let store = FileGraphStore::new(store);
    let record = store.create(&owner, &graph, snapshot).await?;
    println!("{} version {}", record.graph_id, record.version);
    Ok(())
}

/// `list`
pub async fn list(store: &Path, owner: &str) -> Result<()> {
    let owner = OwnerId::parse(owner)?;
    let summaries = FileGraphStore::new(store).list_by_owner(&owner).await?;
    if summaries.is_empty() {
        println!("No graphs for {owner}");
    }
    for summary in summaries {
        println!(
            "{}  v{}  {} nodes  saved {}",
            summary.graph_id, summary.latest_version, summary.node_count, summary.saved_at
        );
    }
    Ok(())
}

/// `show`
pub async fn show(store: &Path, graph: &str) -> Result<()> {
    let graph = GraphId::parse(graph)?;
    let Some(record) = FileGraphStore::new(store).latest(&graph).await? else {
        bail!("Graph {graph} not found");
    };
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// `delete`
pub async fn delete(store: &Path, owner: &str, graph: &str) -> Result<()> {
    let owner = OwnerId::parse(owner)?;
    let graph = GraphId::parse(graph)?;
    if FileGraphStore::new(store).delete(&owner, &graph).await? {
        println!("Deleted {graph}");
        Ok(())
    } else {
        bail!("Graph {graph} not found for {owner}")
    }
}
