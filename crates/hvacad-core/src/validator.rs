//! 工程约束校验
//!
//! 根据风管工程数据与限值表生成有序的违规列表，并为可修正的违规给出
//! 确定性的修正建议。修正建议只依赖输入，同样的输入总是得到同样的结果。

use crate::calc::{self, duct::MIN_DUCT_DIMENSION};
use crate::entity::{DuctProps, DuctShape};
use crate::limits::{EngineeringLimits, SystemBucket};
use crate::math::round_to;
use serde::{Deserialize, Serialize};

/// 推荐风速区间（FPM）
pub const OPTIMAL_VELOCITY_RANGE: (f64, f64) = (1000.0, 1800.0);

/// 风量为零时建议的默认风量
const DEFAULT_FIX_AIRFLOW: f64 = 100.0;

/// 修正尺寸时的最大迭代步数
const MAX_FIX_STEPS: u32 = 200;

/// 风管工程数据
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DuctEngineeringData {
    pub airflow: f64,
    /// 风速（FPM）
    pub velocity: f64,
    /// 每百英尺压降（in.w.g.）
    pub pressure_drop: f64,
    pub friction_factor: f64,
    /// 矩形风管的当量直径
    pub equivalent_diameter: Option<f64>,
    pub reynolds_number: f64,
    pub velocity_pressure: f64,
}

/// 计算风管工程数据
pub fn engineering_data(props: &DuctProps, limits: &EngineeringLimits) -> DuctEngineeringData {
    let velocity = velocity_of(props);
    let diameter = calc::effective_diameter(props);
    let friction_factor = limits.friction_factors.for_material(props.material);
    DuctEngineeringData {
        airflow: props.airflow,
        velocity,
        pressure_drop: calc::friction_loss(velocity, diameter, 100.0, friction_factor),
        friction_factor,
        equivalent_diameter: match props.shape {
            DuctShape::Rectangular => Some(round_to(diameter, 2)),
            DuctShape::Round => None,
        },
        reynolds_number: round_to(calc::reynolds_number(velocity, diameter), 0),
        velocity_pressure: calc::velocity_pressure(velocity),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// 违规类型（声明顺序与名称字典序一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    AirflowZero,
    PressureDropMax,
    VelocityMax,
    VelocityMin,
    VelocityOptimal,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::AirflowZero => "airflow-zero",
            ViolationKind::PressureDropMax => "pressure-drop-max",
            ViolationKind::VelocityMax => "velocity-max",
            ViolationKind::VelocityMin => "velocity-min",
            ViolationKind::VelocityOptimal => "velocity-optimal",
        }
    }
}

/// 一键修正建议
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedFix {
    Diameter(f64),
    Dimensions { width: f64, height: f64 },
    Airflow(f64),
}

impl SuggestedFix {
    pub fn apply(&self, props: &mut DuctProps) {
        match *self {
            SuggestedFix::Diameter(diameter) => props.diameter = Some(diameter),
            SuggestedFix::Dimensions { width, height } => {
                props.width = Some(width);
                props.height = Some(height);
            }
            SuggestedFix::Airflow(airflow) => props.airflow = airflow,
        }
    }

    pub fn description(&self) -> String {
        match self {
            SuggestedFix::Diameter(diameter) => format!("Resize to {}\" diameter", diameter),
            SuggestedFix::Dimensions { width, height } => {
                format!("Resize to {}\" x {}\"", width, height)
            }
            SuggestedFix::Airflow(airflow) => format!("Set airflow to {} CFM", airflow),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub severity: Severity,
    pub message: String,
    pub suggested_fix: Option<SuggestedFix>,
}

/// 校验结果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConstraintStatus {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
}

impl ConstraintStatus {
    /// 排序并计算有效性
    pub fn from_violations(mut violations: Vec<Violation>) -> Self {
        violations.sort_by(|a, b| {
            a.severity
                .cmp(&b.severity)
                .then(a.kind.cmp(&b.kind))
                .then_with(|| a.message.cmp(&b.message))
        });
        Self {
            is_valid: !violations.iter().any(|v| v.severity == Severity::Error),
            violations,
        }
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }

    pub fn violations_of(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }

    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations_of(kind).next().is_some()
    }
}

/// 风管约束校验器
#[derive(Debug, Clone, Default)]
pub struct ConstraintValidator {
    limits: EngineeringLimits,
}

impl ConstraintValidator {
    pub fn new(limits: EngineeringLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &EngineeringLimits {
        &self.limits
    }

    /// 计算工程数据并校验
    pub fn check(&self, props: &DuctProps) -> (DuctEngineeringData, ConstraintStatus) {
        let data = engineering_data(props, &self.limits);
        let status = self.validate(props, &data);
        (data, status)
    }

    pub fn validate(&self, props: &DuctProps, data: &DuctEngineeringData) -> ConstraintStatus {
        let bucket = SystemBucket::for_system(props.system_type);
        let thresholds = self.limits.thresholds(bucket);
        let mut violations = Vec::new();

        if data.airflow <= 0.0 {
            violations.push(Violation {
                kind: ViolationKind::AirflowZero,
                severity: Severity::Error,
                message: "Airflow must be greater than 0 CFM".to_string(),
                suggested_fix: Some(SuggestedFix::Airflow(DEFAULT_FIX_AIRFLOW)),
            });
        }

        if data.velocity > thresholds.max_velocity {
            violations.push(Violation {
                kind: ViolationKind::VelocityMax,
                severity: Severity::Error,
                message: format!(
                    "Velocity {} FPM exceeds {} maximum of {} FPM",
                    data.velocity, bucket, thresholds.max_velocity
                ),
                suggested_fix: velocity_max_fix(props, thresholds.max_velocity),
            });
        } else if data.velocity > 0.0 && data.velocity < thresholds.min_velocity {
            violations.push(Violation {
                kind: ViolationKind::VelocityMin,
                severity: Severity::Warning,
                message: format!(
                    "Velocity {} FPM is below {} minimum of {} FPM",
                    data.velocity, bucket, thresholds.min_velocity
                ),
                suggested_fix: velocity_min_fix(props, thresholds.min_velocity),
            });
        }

        if data.velocity < OPTIMAL_VELOCITY_RANGE.0 || data.velocity > OPTIMAL_VELOCITY_RANGE.1 {
            violations.push(Violation {
                kind: ViolationKind::VelocityOptimal,
                severity: Severity::Info,
                message: format!(
                    "Velocity {} FPM is outside the optimal range of {}-{} FPM",
                    data.velocity, OPTIMAL_VELOCITY_RANGE.0, OPTIMAL_VELOCITY_RANGE.1
                ),
                suggested_fix: None,
            });
        }

        if data.pressure_drop > thresholds.max_pressure_drop {
            violations.push(Violation {
                kind: ViolationKind::PressureDropMax,
                severity: Severity::Error,
                message: format!(
                    "Pressure drop {:.2} in.w.g./100ft exceeds {} maximum of {:.2}",
                    data.pressure_drop, bucket, thresholds.max_pressure_drop
                ),
                suggested_fix: pressure_drop_fix(
                    props,
                    data.pressure_drop,
                    thresholds.max_pressure_drop,
                    data.friction_factor,
                ),
            });
        }

        ConstraintStatus::from_violations(violations)
    }

    /// 只保留错误级别的违规
    pub fn validate_critical(&self, props: &DuctProps, data: &DuctEngineeringData) -> ConstraintStatus {
        let status = self.validate(props, data);
        ConstraintStatus::from_violations(
            status
                .violations
                .into_iter()
                .filter(|v| v.severity == Severity::Error)
                .collect(),
        )
    }
}

// ========== 修正建议 ==========

fn velocity_of(props: &DuctProps) -> f64 {
    calc::velocity(props.airflow, calc::duct_area(props.shape, &props.dimensions()))
}

fn pressure_drop_of(props: &DuctProps, friction_factor: f64) -> f64 {
    calc::friction_loss(
        velocity_of(props),
        calc::effective_diameter(props),
        100.0,
        friction_factor,
    )
}

/// 逐英寸放大截面直到满足条件；矩形每次放大较短边
fn grow_until(props: &DuctProps, start: SuggestedFix, satisfied: impl Fn(&DuctProps) -> bool) -> SuggestedFix {
    let mut fix = start;
    for _ in 0..MAX_FIX_STEPS {
        let mut candidate = props.clone();
        fix.apply(&mut candidate);
        if satisfied(&candidate) {
            break;
        }
        fix = match fix {
            SuggestedFix::Diameter(d) => SuggestedFix::Diameter(d + 1.0),
            SuggestedFix::Dimensions { width, height } if height <= width => {
                SuggestedFix::Dimensions {
                    width,
                    height: height + 1.0,
                }
            }
            SuggestedFix::Dimensions { width, height } => SuggestedFix::Dimensions {
                width: width + 1.0,
                height,
            },
            other => other,
        };
    }
    fix
}

/// 逐英寸缩小截面直到满足条件或到达最小边长；矩形每次缩小较长边
fn shrink_until(props: &DuctProps, start: SuggestedFix, satisfied: impl Fn(&DuctProps) -> bool) -> SuggestedFix {
    let mut fix = start;
    for _ in 0..MAX_FIX_STEPS {
        let mut candidate = props.clone();
        fix.apply(&mut candidate);
        if satisfied(&candidate) {
            break;
        }
        fix = match fix {
            SuggestedFix::Diameter(d) if d > MIN_DUCT_DIMENSION => SuggestedFix::Diameter(d - 1.0),
            SuggestedFix::Dimensions { width, height } if width >= height && width > MIN_DUCT_DIMENSION => {
                SuggestedFix::Dimensions {
                    width: width - 1.0,
                    height,
                }
            }
            SuggestedFix::Dimensions { width, height } if height > MIN_DUCT_DIMENSION => {
                SuggestedFix::Dimensions {
                    width,
                    height: height - 1.0,
                }
            }
            other => return other,
        };
    }
    fix
}

/// 按面积比例缩放截面（整数英寸）
fn scaled_section(props: &DuctProps, linear_scale: f64, round: fn(f64) -> f64) -> Option<SuggestedFix> {
    match props.shape {
        DuctShape::Round => {
            let diameter = props.diameter?;
            Some(SuggestedFix::Diameter(
                round(diameter * linear_scale).max(MIN_DUCT_DIMENSION),
            ))
        }
        DuctShape::Rectangular => {
            let (width, height) = props.width.zip(props.height)?;
            Some(SuggestedFix::Dimensions {
                width: round(width * linear_scale).max(MIN_DUCT_DIMENSION),
                height: round(height * linear_scale).max(MIN_DUCT_DIMENSION),
            })
        }
    }
}

fn current_area(props: &DuctProps) -> f64 {
    calc::duct_area(props.shape, &props.dimensions())
}

fn velocity_max_fix(props: &DuctProps, max_velocity: f64) -> Option<SuggestedFix> {
    let target = (max_velocity - 5.0).max(1.0);
    let start = match props.shape {
        DuctShape::Round => {
            props.diameter?;
            SuggestedFix::Diameter(
                calc::round_diameter(props.airflow, target)
                    .ceil()
                    .max(MIN_DUCT_DIMENSION),
            )
        }
        DuctShape::Rectangular => {
            let area = current_area(props);
            if area <= 0.0 {
                return None;
            }
            let required = props.airflow / target * 144.0;
            scaled_section(props, (required / area).sqrt().max(1.0), f64::ceil)?
        }
    };
    Some(grow_until(props, start, |candidate| {
        velocity_of(candidate) <= max_velocity
    }))
}

fn velocity_min_fix(props: &DuctProps, min_velocity: f64) -> Option<SuggestedFix> {
    let target = min_velocity + 5.0;
    let start = match props.shape {
        DuctShape::Round => {
            props.diameter?;
            SuggestedFix::Diameter(
                calc::round_diameter(props.airflow, target)
                    .floor()
                    .max(MIN_DUCT_DIMENSION),
            )
        }
        DuctShape::Rectangular => {
            let area = current_area(props);
            if area <= 0.0 {
                return None;
            }
            let required = props.airflow / target * 144.0;
            scaled_section(props, (required / area).sqrt().min(1.0), f64::floor)?
        }
    };
    Some(shrink_until(props, start, |candidate| {
        velocity_of(candidate) >= min_velocity
    }))
}

fn pressure_drop_fix(
    props: &DuctProps,
    pressure_drop: f64,
    max_pressure_drop: f64,
    friction_factor: f64,
) -> Option<SuggestedFix> {
    if pressure_drop <= 0.0 || max_pressure_drop <= 0.0 {
        return None;
    }
    // 风量不变时压降约与直径的 -5.02 次方成正比
    let scale = (pressure_drop / max_pressure_drop).powf(1.0 / 5.02).max(1.0);
    let start = scaled_section(props, scale, f64::ceil)?;
    Some(grow_until(props, start, |candidate| {
        pressure_drop_of(candidate, friction_factor) <= max_pressure_drop
    }))
}
