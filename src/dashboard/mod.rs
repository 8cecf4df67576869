//! Learner dashboard: stats and recent activity

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ApiError};
use crate::render::Element;

/// Aggregate learner statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    #[serde(alias = "lessonsCompleted")]
    pub lessons_completed: u32,
    #[serde(alias = "totalLessons")]
    pub total_lessons: u32,
    #[serde(alias = "currentStreak", alias = "streak")]
    pub current_streak: u32,
    pub points: u32,
    #[serde(alias = "challengesCompleted")]
    pub challenges_completed: u32,
}

impl DashboardStats {
    pub fn completion_percent(&self) -> u8 {
        crate::progress::percentage(self.lessons_completed as usize, self.total_lessons as usize)
    }
}

/// One entry of the activity feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityItem {
    #[serde(alias = "type")]
    pub kind: String,
    pub title: String,
    /// ISO 8601 timestamp as sent by the server
    #[serde(alias = "created_at", alias = "createdAt")]
    pub timestamp: String,
}

/// Where dashboard data comes from
pub trait DashboardSource: Send + Sync {
    fn stats(&self) -> BoxFuture<'_, Result<DashboardStats, ApiError>>;
    fn activity(&self) -> BoxFuture<'_, Result<Vec<ActivityItem>, ApiError>>;
}

impl DashboardSource for ApiClient {
    fn stats(&self) -> BoxFuture<'_, Result<DashboardStats, ApiError>> {
        self.get_json("/api/dashboard/stats").boxed()
    }

    fn activity(&self) -> BoxFuture<'_, Result<Vec<ActivityItem>, ApiError>> {
        self.get_json("/api/dashboard/activity").boxed()
    }
}

/// Stats and activity, loaded together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub activity: Vec<ActivityItem>,
}

impl Dashboard {
    /// Fetch both feeds concurrently. A failing activity feed leaves it empty;
    /// a failing stats request is an error.
    pub async fn load(source: &dyn DashboardSource) -> Result<Self, ApiError> {
        let (stats, activity) = future::join(source.stats(), source.activity()).await;
        let activity = activity.unwrap_or_else(|e| {
            tracing::warn!("Activity feed unavailable: {}", e);
            Vec::new()
        });
        Ok(Self { stats: stats?, activity })
    }

    /// HTML widget
    pub fn render(&self) -> Element {
        let stat = |label: &str, value: String| {
            Element::new("div")
                .class("stat")
                .child(Element::new("span").class("stat-value").text(value))
                .child(Element::new("span").class("stat-label").text(label))
        };
        let s = &self.stats;

        let stats = Element::new("div").class("dashboard-stats").children([
            stat("Lessons", format!("{}/{}", s.lessons_completed, s.total_lessons)),
            stat("Day streak", s.current_streak.to_string()),
            stat("Points", s.points.to_string()),
            stat("Challenges", s.challenges_completed.to_string()),
        ]);

        let activity = if self.activity.is_empty() {
            Element::new("p").class("empty").text("No recent activity.")
        } else {
            Element::new("ul").class("activity").children(self.activity.iter().map(|item| {
                Element::new("li")
                    .data("kind", item.kind.as_str())
                    .child(Element::new("span").class("activity-title").text(item.title.clone()))
                    .child(Element::new("time").text(item.timestamp.clone()))
            }))
        };

        Element::new("div").id("dashboard").child(stats).child(activity)
    }

    /// Plain text for the command line
    pub fn to_text(&self) -> String {
        let s = &self.stats;
        let mut out = format!(
            "Lessons completed: {}/{} ({}%)\nCurrent streak:    {} days\nPoints:            {}\nChallenges:        {}\n",
            s.lessons_completed,
            s.total_lessons,
            s.completion_percent(),
            s.current_streak,
            s.points,
            s.challenges_completed
        );
        if !self.activity.is_empty() {
            out.push_str("\nRecent activity:\n");
            for item in &self.activity {
                out.push_str(&format!("  {}  {} ({})\n", item.timestamp, item.title, item.kind));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct FakeDashboard {
        activity_fails: bool,
    }

    impl DashboardSource for FakeDashboard {
        fn stats(&self) -> BoxFuture<'_, Result<DashboardStats, ApiError>> {
            async {
                Ok(DashboardStats { lessons_completed: 3, total_lessons: 12, points: 40, ..Default::default() })
            }
            .boxed()
        }

        fn activity(&self) -> BoxFuture<'_, Result<Vec<ActivityItem>, ApiError>> {
            let fails = self.activity_fails;
            async move {
                if fails {
                    Err(ApiError::Status { status: 500, message: "oops".into() })
                } else {
                    Ok(vec![ActivityItem {
                        kind: "lesson".into(),
                        title: "Variables".into(),
                        timestamp: "2026-10-01T10:00:00Z".into(),
                    }])
                }
            }
            .boxed()
        }
    }

    #[test]
    fn stats_accept_camel_case_and_missing_fields() {
        let stats: DashboardStats =
            serde_json::from_value(json!({ "lessonsCompleted": 2, "totalLessons": 8 })).unwrap();
        assert_eq!(stats.completion_percent(), 25);
        assert_eq!(stats.points, 0);
    }

    #[tokio::test]
    async fn activity_failure_degrades_to_empty() {
        let dashboard = Dashboard::load(&FakeDashboard { activity_fails: true }).await.unwrap();
        assert_eq!(dashboard.stats.lessons_completed, 3);
        assert!(dashboard.activity.is_empty());
        assert!(dashboard.render().to_html().contains("No recent activity."));
    }

    #[tokio::test]
    async fn text_summary_lists_activity() {
        let dashboard = Dashboard::load(&FakeDashboard { activity_fails: false }).await.unwrap();
        let text = dashboard.to_text();
        assert!(text.contains("Lessons completed: 3/12 (25%)"));
        assert!(text.contains("Variables (lesson)"));
    }
}
