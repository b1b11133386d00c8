//! Fixed "Insights & Interpretation" narrative shown at the bottom of the page.

pub const INSIGHTS_HEADER: &str = "📝 Insights & Interpretation";

pub const INSIGHTS_MARKDOWN: &str = r#"### 1. Safety Performance
- The *Safe vs Unsafe Boilers* chart shows the overall balance of healthy vs at-risk boilers.
- The percentage of safe boilers is a quick KPI to assess overall plant health.

### 2. Key Risk Indicators
- Certain features, such as **Flue Gas Temperature** and **Steam Pressure**, have a strong influence on whether a boiler is considered safe.
- Large deviations in these readings often align with Unsafe predictions.

### 3. Relationships Between Variables
- The **Status vs Features boxplots** reveal patterns: for example, Unsafe boilers may have higher flue gas temperatures or lower drum levels.
- The correlation heatmap helps identify which sensors move together, useful for maintenance planning.

### 4. Predictive Model
- The prediction tool allows real-time entry of sensor data to check safety status before problems escalate.
- This can help operators take preventive action, reducing downtime and maintenance costs.

### 5. Next Steps
- Regular monitoring of these patterns can improve predictive maintenance schedules.
- Focus maintenance efforts on the top contributing features identified in feature importance.

---

**Bottom line:** This dashboard is both a monitoring tool and a decision-support system. It not only flags potential faults but also guides you on *where* to look and *why* the model thinks a fault might occur.
"#;
