//! Diesel schema for workflow persistence.

diesel::table! {
    /// Configured workflow steps.
    steps (id) {
        /// Step identifier.
        id -> BigInt,
        /// Owning workflow.
        workflow_id -> BigInt,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// `normal` or `terminal`.
        #[max_length = 20]
        step_type -> Varchar,
        /// Successor step.
        next_step_id -> Nullable<BigInt>,
        /// Failure-redirect step.
        fail_step_id -> Nullable<BigInt>,
        /// Owner policy for projects entering the step.
        #[max_length = 20]
        owner_type -> Varchar,
    }
}

diesel::table! {
    /// Problem catalog.
    problems (id) {
        /// Problem identifier.
        id -> BigInt,
        /// Machine name.
        #[max_length = 255]
        name -> Varchar,
        /// Display label.
        #[max_length = 255]
        label -> Varchar,
    }
}

diesel::table! {
    /// Project headers.
    projects (id) {
        /// Project identifier.
        id -> BigInt,
        /// Workflow followed by the project.
        workflow_id -> BigInt,
        /// Current step.
        current_step_id -> BigInt,
        /// Current owner.
        owner_id -> Nullable<BigInt>,
        /// Time work first started.
        started_at -> Nullable<Timestamptz>,
        /// Time the terminal step finished.
        finished_at -> Nullable<Timestamptz>,
        /// Status of the physical unit.
        #[max_length = 50]
        unit_status -> Varchar,
    }
}

diesel::table! {
    /// Assignment history.
    assignments (id) {
        /// Assignment identifier.
        id -> Uuid,
        /// Insertion order; the highest value is the active assignment.
        sequence -> BigInt,
        /// Owning project.
        project_id -> BigInt,
        /// Step being worked.
        step_id -> BigInt,
        /// Assigned staff member.
        staff_member_id -> Nullable<BigInt>,
        /// Assignment status.
        #[max_length = 20]
        status -> Varchar,
        /// Creation timestamp.
        assigned_at -> Timestamptz,
        /// Latest start timestamp.
        started_at -> Nullable<Timestamptz>,
        /// Finish timestamp.
        finished_at -> Nullable<Timestamptz>,
        /// Recorded working time.
        duration_minutes -> Integer,
    }
}

diesel::table! {
    /// Project notes.
    notes (id) {
        /// Note identifier.
        id -> Uuid,
        /// Insertion order, used to break creation-time ties.
        sequence -> BigInt,
        /// Owning project.
        project_id -> BigInt,
        /// Step the note refers to.
        step_id -> BigInt,
        /// Author.
        staff_member_id -> Nullable<BigInt>,
        /// Note type.
        #[max_length = 20]
        note_type -> Varchar,
        /// Free text.
        text -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Links between notes and problems.
    notes_problems (note_id, problem_id) {
        /// Linked note.
        note_id -> Uuid,
        /// Linked problem.
        problem_id -> BigInt,
        /// Link order within the note.
        position -> Integer,
    }
}

diesel::joinable!(assignments -> projects (project_id));
diesel::joinable!(notes -> projects (project_id));
diesel::joinable!(notes_problems -> notes (note_id));
diesel::joinable!(notes_problems -> problems (problem_id));

diesel::allow_tables_to_appear_in_same_query!(
    assignments,
    notes,
    notes_problems,
    problems,
    projects,
    steps,
);
