//! HVACAD 演示程序
//!
//! 无界面脚本会话：绘制房间、风管和设备，触发一次参数化修正，
//! 然后撤销/重做并打印文档摘要。
//!
//! 用法：`hvacad [config.json]`

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use hvacad_core::config::EditorConfig;
use hvacad_core::entity::{EntityId, EntityKind};
use hvacad_core::parametric::DuctPropsPatch;
use hvacad_core::store::EntityStore;
use hvacad_tools::{Editor, PointerEvent, ToolKind, ToolOutcome};

fn load_config() -> Result<EditorConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {}", path))?;
            EditorConfig::from_json_str(&json).with_context(|| format!("invalid config {}", path))
        }
        None => Ok(EditorConfig::default()),
    }
}

fn drag(editor: &mut Editor, from: (f64, f64), to: (f64, f64)) -> ToolOutcome {
    editor.pointer_down(PointerEvent::left(from.0, from.1));
    editor.pointer_move(PointerEvent::left(to.0, to.1));
    editor.pointer_up(PointerEvent::left(to.0, to.1))
}

fn first_id(outcome: &ToolOutcome) -> Result<EntityId> {
    outcome
        .committed_ids()
        .first()
        .copied()
        .with_context(|| format!("expected a committed entity, got {:?}", outcome))
}

/// 把风管改窄以触发超速，再应用建议的修正
async fn resize_and_fix(editor: &mut Editor, duct: EntityId) -> Result<()> {
    let document = editor.document_mut();
    let result = document.schedule_duct_change(duct, DuctPropsPatch::diameter(6.0))?.await;
    for v in &result.violations {
        warn!("{}: {}", v.violation.kind.as_str(), v.violation.message);
    }
    let fix = result
        .violations
        .iter()
        .find_map(|v| v.violation.suggested_fix);
    document.commit_parametric(result)?;

    if let Some(fix) = fix {
        info!("Applying fix: {}", fix.description());
        let fixed = document.schedule_fix(duct, fix)?.await;
        document.commit_parametric(fixed)?;
    }
    Ok(())
}

fn print_summary(store: &EntityStore) {
    println!("{} entities", store.len());
    for entity in store.sorted_by_z() {
        let name = entity.name().unwrap_or(entity.entity_type().label());
        match &entity.kind {
            EntityKind::Room(room) => println!(
                "  [{}] {} area={} sqft volume={} cuft required={} cfm",
                entity.z_index, name, room.calculated.area, room.calculated.volume, room.calculated.required_cfm
            ),
            EntityKind::Duct(duct) => println!(
                "  [{}] {} d={:?} velocity={} fpm friction={} in.w.g./100ft",
                entity.z_index, name, duct.props.diameter, duct.calculated.velocity, duct.calculated.friction_loss
            ),
            _ => println!("  [{}] {}", entity.z_index, name),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = load_config()?;

    // 初始化日志（RUST_LOG 优先）
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing::subscriber::set_global_default(FmtSubscriber::builder().with_env_filter(filter).finish())?;

    info!("Starting HVACAD session...");
    let mut editor = Editor::new(config);

    editor.set_tool(ToolKind::Room);
    first_id(&drag(&mut editor, (0.0, 0.0), (240.0, 180.0)))?;

    editor.set_tool(ToolKind::Duct);
    let duct = first_id(&drag(&mut editor, (24.0, 24.0), (264.0, 24.0)))?;
    resize_and_fix(&mut editor, duct).await?;

    editor.set_tool(ToolKind::Equipment);
    editor.pointer_down(PointerEvent::left(300.0, 96.0));

    print_summary(editor.document().store());

    let mut undone = 0;
    while editor.undo() {
        undone += 1;
    }
    info!("Undid {} commands", undone);
    for _ in 0..undone {
        editor.redo();
    }
    info!(
        "Redid {} commands, can undo: {}",
        undone,
        editor.document().can_undo()
    );

    print_summary(editor.document().store());
    Ok(())
}
