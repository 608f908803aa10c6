use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use rollcall_auth::Role;
use rollcall_core::Weekday;
use rollcall_core::errors::ErrorResponse;

use crate::modules::auth::model::{LoginRequest, LoginResponse, MessageResponse};
use crate::modules::classrooms::model::{
    AssignTeacherDto, Classroom, ClassroomDetail, ClassroomResponse, CreateClassroomDto,
    MemberSummary, RemoveTeacherDto, ScheduleEntry, UpdateStudentsDto,
};
use crate::modules::timetables::model::{
    DayTimetable, Period, Timetable, TimetableRequest, TimetablesResponse,
};
use crate::modules::users::model::{
    ClassroomSummary, CreateUserDto, CreateUserResponse, UpdateUserDto, UpdateUserResponse, User,
    UserRole, UserWithClassroom,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::user_login,
        crate::modules::auth::controller::principal_login,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::users::controller::get_students,
        crate::modules::users::controller::get_teachers,
        crate::modules::users::controller::get_available_students,
        crate::modules::users::controller::get_available_teachers,
        crate::modules::users::controller::get_profile,
        crate::modules::classrooms::controller::create_classroom,
        crate::modules::classrooms::controller::delete_classroom,
        crate::modules::classrooms::controller::assign_teacher,
        crate::modules::classrooms::controller::remove_teacher,
        crate::modules::classrooms::controller::update_students,
        crate::modules::classrooms::controller::get_classrooms,
        crate::modules::timetables::controller::create_timetable,
        crate::modules::timetables::controller::update_timetable,
        crate::modules::timetables::controller::get_timetable,
    ),
    components(
        schemas(
            Role,
            Weekday,
            ErrorResponse,
            MessageResponse,
            LoginRequest,
            LoginResponse,
            User,
            UserRole,
            UserWithClassroom,
            ClassroomSummary,
            CreateUserDto,
            UpdateUserDto,
            CreateUserResponse,
            UpdateUserResponse,
            ScheduleEntry,
            Classroom,
            ClassroomDetail,
            MemberSummary,
            CreateClassroomDto,
            AssignTeacherDto,
            RemoveTeacherDto,
            UpdateStudentsDto,
            ClassroomResponse,
            Period,
            DayTimetable,
            Timetable,
            TimetableRequest,
            TimetablesResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Principal and user login"),
        (name = "Users", description = "Teacher and student accounts"),
        (name = "Classrooms", description = "Classrooms and their rosters"),
        (name = "Timetables", description = "Per-day class periods of a classroom"),
    ),
    info(
        title = "Rollcall API",
        version = "0.1.0",
        description = "School administration backend: classrooms, rosters, timetables, and the accounts that use them.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
