//! Built-in command handlers.

use canvas_core::{validate, AgentDocument, CoreError, NewEdge, NewNode, Position};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};

use super::{decode_params, CommandContext};

/// Export name used when the controller gives none
const DEFAULT_EXPORT_NAME: &str = "My Agent";

#[derive(Deserialize)]
struct CreateNodeParams {
    #[serde(rename = "type", deserialize_with = "opaque_string")]
    kind: String,
    label: Option<String>,
    position: Option<Position>,
    config: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateNodeParams {
    node_id: String,
    label: Option<String>,
    config: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeIdParams {
    node_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectParams {
    source_id: String,
    target_id: String,
    source_handle: Option<String>,
    target_handle: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DisconnectParams {
    source_id: String,
    target_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateParams {
    template_id: String,
}

#[derive(Deserialize)]
struct ExportParams {
    name: Option<String>,
}

/// Node types are opaque: a non-string type is kept as its JSON text
fn opaque_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

pub(super) fn create_node(ctx: &mut CommandContext<'_>, params: Value) -> Result<Value, CoreError> {
    let params: CreateNodeParams = decode_params(params)?;
    let node = ctx.store.create_node(NewNode {
        kind: params.kind,
        label: params.label,
        position: params.position,
        config: params.config,
    });

    Ok(json!({
        "success": true,
        "nodeId": node.id,
        "message": format!("Node \"{}\" ({}) created.", node.data.label, node.kind),
    }))
}

pub(super) fn update_node(ctx: &mut CommandContext<'_>, params: Value) -> Result<Value, CoreError> {
    let params: UpdateNodeParams = decode_params(params)?;
    // Unknown ids are a silent no-op.
    ctx.store
        .update_node(&params.node_id, params.label.as_deref(), params.config.as_ref());

    Ok(json!({
        "success": true,
        "message": format!("Node \"{}\" updated.", params.node_id),
    }))
}

pub(super) fn delete_node(ctx: &mut CommandContext<'_>, params: Value) -> Result<Value, CoreError> {
    let params: NodeIdParams = decode_params(params)?;
    ctx.store.delete_node(&params.node_id);

    Ok(json!({
        "success": true,
        "message": format!("Node \"{}\" deleted.", params.node_id),
    }))
}

pub(super) fn connect_nodes(ctx: &mut CommandContext<'_>, params: Value) -> Result<Value, CoreError> {
    let params: ConnectParams = decode_params(params)?;
    let edge = ctx.store.connect(NewEdge {
        source: params.source_id,
        target: params.target_id,
        source_handle: params.source_handle,
        target_handle: params.target_handle,
    })?;

    Ok(json!({
        "success": true,
        "edgeId": edge.id,
        "message": format!("Connected \"{}\" to \"{}\".", edge.source, edge.target),
    }))
}

pub(super) fn disconnect_nodes(ctx: &mut CommandContext<'_>, params: Value) -> Result<Value, CoreError> {
    let params: DisconnectParams = decode_params(params)?;
    ctx.store.disconnect(&params.source_id, &params.target_id);

    Ok(json!({
        "success": true,
        "message": format!(
            "Disconnected \"{}\" from \"{}\".",
            params.source_id, params.target_id
        ),
    }))
}

pub(super) fn clear_canvas(ctx: &mut CommandContext<'_>, _params: Value) -> Result<Value, CoreError> {
    ctx.store.clear();

    Ok(json!({
        "success": true,
        "message": "Canvas cleared.",
    }))
}

pub(super) fn load_template(ctx: &mut CommandContext<'_>, params: Value) -> Result<Value, CoreError> {
    let params: TemplateParams = decode_params(params)?;
    let template = ctx
        .templates
        .get(&params.template_id)
        .ok_or(CoreError::TemplateNotFound(params.template_id))?;

    ctx.store.load_template(&template);

    Ok(json!({
        "success": true,
        "message": format!("Template \"{}\" loaded.", template.name),
        "nodeCount": template.nodes.len(),
        "edgeCount": template.edges.len(),
    }))
}

pub(super) fn validate_agent(ctx: &mut CommandContext<'_>, _params: Value) -> Result<Value, CoreError> {
    let report = validate(ctx.store.graph());
    let message = if report.valid {
        "Agent configuration is valid.".to_string()
    } else {
        format!("Validation failed: {}", report.errors.join(", "))
    };

    Ok(json!({
        "valid": report.valid,
        "errors": report.errors,
        "message": message,
    }))
}

pub(super) fn export_agent(ctx: &mut CommandContext<'_>, params: Value) -> Result<Value, CoreError> {
    let params: ExportParams = decode_params(params)?;
    let name = params
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_EXPORT_NAME.to_string());

    let json = AgentDocument::from_graph(ctx.store.graph(), &name, "").to_json_pretty()?;

    Ok(json!({
        "success": true,
        "json": json,
        "message": "Agent exported as JSON.",
    }))
}
