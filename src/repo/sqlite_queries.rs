pub const QUERY_GET_PET: &str = r#"
SELECT
    id,customer_id,pet_name,species,size,weight,
    allow_perfume,allow_accessories,created_at,updated_at
FROM pet
WHERE id=$1 AND org_id=$2;
"#;

pub const QUERY_UPDATE_PET_PREFERENCES: &str = r#"
UPDATE pet SET allow_perfume=$1, allow_accessories=$2, updated_at=$3
WHERE id=$4 AND org_id=$5;
"#;

pub const QUERY_GET_SERVICE: &str = r#"
SELECT
    id,name,base_price,duration_minutes,target_species,
    scheduling_rules,pricing_matrix,checklist_template,
    created_at,updated_at
FROM service
WHERE id=$1 AND org_id=$2;
"#;

pub const QUERY_GET_APPOINTMENT: &str = r#"
SELECT
    id,pet_id,service_id,package_id,scheduled_at,
    check_in_date,check_out_date,status,checklist,notes,
    calculated_price,final_price,discount_percent,
    payment_status,payment_method,paid_at,
    actual_check_in,actual_check_out,created_at,updated_at
FROM appointment
WHERE id=$1 AND org_id=$2;
"#;

pub const QUERY_GET_PACKAGE_APPOINTMENTS: &str = r#"
SELECT
    id,pet_id,service_id,package_id,scheduled_at,
    check_in_date,check_out_date,status,checklist,notes,
    calculated_price,final_price,discount_percent,
    payment_status,payment_method,paid_at,
    actual_check_in,actual_check_out,created_at,updated_at
FROM appointment
WHERE package_id=$1 AND org_id=$2
ORDER BY scheduled_at ASC, id ASC;
"#;

pub const QUERY_INSERT_APPOINTMENT: &str = r#"
INSERT INTO appointment (
    org_id,pet_id,service_id,package_id,scheduled_at,
    check_in_date,check_out_date,status,checklist,notes,
    calculated_price,final_price,discount_percent,
    payment_status,payment_method,paid_at,
    actual_check_in,actual_check_out,created_at,updated_at
) VALUES(
    $1,$2,$3,$4,$5,
    $6,$7,$8,$9,$10,
    $11,$12,$13,
    $14,$15,$16,
    $17,$18,$19,$20
);
"#;

pub const QUERY_UPDATE_APPOINTMENT: &str = r#"
UPDATE appointment SET
    status=$1,checklist=$2,notes=$3,
    calculated_price=$4,final_price=$5,discount_percent=$6,
    payment_status=$7,payment_method=$8,paid_at=$9,
    actual_check_in=$10,actual_check_out=$11,updated_at=$12
WHERE id=$13 AND org_id=$14;
"#;

pub const QUERY_DELETE_APPOINTMENT: &str = r#"
DELETE FROM appointment WHERE id=$1 AND org_id=$2 AND actual_check_in IS NULL;
"#;

pub const QUERY_GET_SCHEDULE_BLOCKS_BETWEEN: &str = r#"
SELECT id,start_at,end_at,reason,created_at
FROM schedule_block
WHERE org_id=$1 AND end_at > $2 AND start_at < $3
ORDER BY start_at ASC;
"#;

pub const QUERY_INSERT_SCHEDULE_BLOCK: &str = r#"
INSERT INTO schedule_block(org_id,start_at,end_at,reason,created_at) VALUES($1,$2,$3,$4,$5);
"#;

pub const QUERY_DELETE_SCHEDULE_BLOCK: &str =
    r#"DELETE FROM schedule_block WHERE id=$1 AND org_id=$2;"#;

pub const QUERY_GET_SERVICE_PACKAGE: &str = r#"
SELECT id,pet_id,service_id,total_qty,purchased_at,expires_at
FROM service_package
WHERE id=$1 AND org_id=$2;
"#;
