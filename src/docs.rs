use crate::api::assignment::{
    AssignmentEntry, CreateAssignment, MyAssignment, UpdateAssignment,
};
use crate::api::attendance::{
    ConfirmRequest, ConfirmationSnapshot, HistoryEntry, HistoryLocation, HistoryQuery,
    HistoryResult, HistorySchedule, PendingAssignment, ScheduleInfo, TodayAssignment, WindowInfo,
};
use crate::api::location::{
    CreateLocation, NearbyLocation, NearbyQuery, UpdateLocation, ValidatePosition,
};
use crate::api::reports::{
    DailyBreakdown, MarkedPosition, ReportEmployee, ReportEntry, ReportLocation, ReportQuery,
    ReportResult, ReportSchedule, StatisticsQuery, TopEmployee,
};
use crate::attendance::state::DailyState;
use crate::model::location::{ControlLocation, LocationSnapshot};
use crate::model::weekday::Weekday;
use crate::models::{LoginData, LoginRequest};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Confirmation API",
        version = "1.0.0",
        description = r#"
## Geofenced Attendance Confirmation

This API powers a multi-branch attendance system where employees confirm
their presence at assigned control locations from a mobile device.

### 🔹 Key Features
- **Control Locations**
  - Branch admins manage geofenced points with a permitted radius
- **Assignments**
  - Employee + location + weekdays + shift schedule
- **Confirmations**
  - One confirmation per assignment per day, inside a time window
  - GPS distance is evaluated server-side against the geofence
- **Reports**
  - Branch-wide history, daily breakdowns, and top employees

### 🔐 Security
All operational endpoints require **JWT Bearer authentication**.
Employees and branch admins log in through separate endpoints and see
only their own branch's data.

### 📦 Response Format
Every response is a JSON envelope with a `success` flag.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::admin_login,

        crate::api::attendance::today,
        crate::api::attendance::confirm,
        crate::api::attendance::history,
        crate::api::attendance::pending,

        crate::api::reports::report,
        crate::api::reports::statistics,

        crate::api::location::create_location,
        crate::api::location::list_locations,
        crate::api::location::get_location,
        crate::api::location::update_location,
        crate::api::location::delete_location,
        crate::api::location::validate_position,
        crate::api::location::nearby_locations,

        crate::api::assignment::create_assignment,
        crate::api::assignment::list_assignments,
        crate::api::assignment::my_assignments,
        crate::api::assignment::update_assignment,
        crate::api::assignment::delete_assignment
    ),
    components(
        schemas(
            LoginRequest,
            LoginData,
            ConfirmRequest,
            TodayAssignment,
            ScheduleInfo,
            WindowInfo,
            ConfirmationSnapshot,
            HistoryQuery,
            HistoryEntry,
            HistoryLocation,
            HistorySchedule,
            HistoryResult,
            PendingAssignment,
            ReportQuery,
            ReportEntry,
            ReportEmployee,
            ReportLocation,
            ReportSchedule,
            ReportResult,
            MarkedPosition,
            StatisticsQuery,
            DailyBreakdown,
            TopEmployee,
            DailyState,
            Weekday,
            ControlLocation,
            LocationSnapshot,
            CreateLocation,
            UpdateLocation,
            ValidatePosition,
            NearbyQuery,
            NearbyLocation,
            CreateAssignment,
            UpdateAssignment,
            AssignmentEntry,
            MyAssignment
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login endpoints for employees and branch admins"),
        (name = "Attendance", description = "Daily confirmation APIs for employees"),
        (name = "Reports", description = "Branch-wide reporting APIs for admins"),
        (name = "Locations", description = "Control location management APIs"),
        (name = "Assignments", description = "Assignment management APIs"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
