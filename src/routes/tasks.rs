use actix_web::{HttpResponse, delete, get, post, web};

use crate::dto::tasks::TasksQuery;
use crate::forms::tasks::AddTaskForm;
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::blocking;
use crate::services::{ServiceError, tasks};

#[get("/tasks")]
pub async fn list_tasks(
    params: web::Query<TasksQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let tasks =
        blocking(move || tasks::list_tasks(repo.get_ref(), &user, params.into_inner())).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

#[post("/tasks")]
pub async fn create_task(
    form: web::Json<AddTaskForm>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let task =
        blocking(move || tasks::create_task(repo.get_ref(), &user, form.into_inner())).await?;
    Ok(HttpResponse::Created().json(task))
}

#[post("/tasks/{task_id}/complete")]
pub async fn complete_task(
    task_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let task_id = task_id.into_inner();
    let task = blocking(move || tasks::complete_task(repo.get_ref(), &user, task_id)).await?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/tasks/{task_id}")]
pub async fn delete_task(
    task_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let task_id = task_id.into_inner();
    blocking(move || tasks::delete_task(repo.get_ref(), &user, task_id)).await?;
    Ok(HttpResponse::NoContent().finish())
}
